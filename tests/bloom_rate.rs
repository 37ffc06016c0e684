use lineprobe::search::bloom::BloomFilter;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashSet;

fn random_line(rng: &mut StdRng) -> String {
    let len = rng.random_range(8..32);
    (0..len)
        .map(|_| char::from(rng.random_range(b'a'..=b'z')))
        .collect()
}

#[test]
fn false_positive_rate_stays_within_bound() {
    let mut rng = StdRng::seed_from_u64(0x5eed);
    let members: HashSet<String> = (0..20_000).map(|_| random_line(&mut rng)).collect();

    let mut filter = BloomFilter::with_rate(members.len(), 0.001);
    for line in &members {
        filter.insert(line);
    }
    assert!(members.iter().all(|line| filter.contains(line)));

    let mut trials = 0u32;
    let mut false_positives = 0u32;
    while trials < 200_000 {
        let candidate = random_line(&mut rng);
        if members.contains(&candidate) {
            continue;
        }
        trials += 1;
        if filter.contains(&candidate) {
            false_positives += 1;
        }
    }

    let observed = f64::from(false_positives) / f64::from(trials);
    // target 0.1%; allow for sampling noise
    assert!(observed < 0.003, "observed false-positive rate {observed}");
}
