use glam::Vec2;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use lumen::sampler::{create_sampler, Sampler, SamplerKind};
use lumen::sampling;

fn uniform_pairs(rng: &mut SmallRng, n: usize) -> Vec<Vec2> {
    (0..n).map(|_| Vec2::new(rng.gen(), rng.gen())).collect()
}

#[test]
fn sphere_samples_have_uniform_moments() {
    let mut rng = SmallRng::seed_from_u64(7);
    let n = 200_000;
    let mut mean = glam::Vec3::ZERO;
    let mut second = glam::Vec3::ZERO;
    for s in uniform_pairs(&mut rng, n) {
        let d = sampling::square_to_sphere_uniform(s);
        assert!((d.length() - 1.0).abs() < 1e-4);
        mean += d;
        second += d * d;
    }
    mean /= n as f32;
    second /= n as f32;
    for axis in 0..3 {
        assert!(mean[axis].abs() < 0.01, "E[d] should vanish, got {}", mean[axis]);
        assert!(
            (second[axis] - 1.0 / 3.0).abs() < 0.01,
            "E[d²] should be 1/3, got {}",
            second[axis]
        );
    }
}

#[test]
fn cosine_hemisphere_z_has_expected_mean() {
    let mut rng = SmallRng::seed_from_u64(11);
    let n = 200_000;
    let mut mean_z = 0.0f64;
    for s in uniform_pairs(&mut rng, n) {
        let d = sampling::square_to_hemisphere_cosine_z(s);
        assert!(d.z > 0.0);
        mean_z += d.z as f64;
    }
    mean_z /= n as f64;
    assert!((mean_z - 2.0 / 3.0).abs() < 0.01, "E[z] should be 2/3, got {}", mean_z);
}

#[test]
fn disc_samples_stay_inside_the_disc() {
    let mut rng = SmallRng::seed_from_u64(13);
    for s in uniform_pairs(&mut rng, 10_000) {
        let p = sampling::square_to_disc(s);
        assert!(p.length() <= 1.0 + 1e-5);
    }
}

#[test]
fn decide_and_rescale_preserves_probability_and_uniformity() {
    let mut rng = SmallRng::seed_from_u64(17);
    let p = 0.3;
    let n = 100_000;
    let mut hits = 0usize;
    let mut rescaled_sum = 0.0f64;
    let mut rescaled_count = 0usize;
    for _ in 0..n {
        let mut s: f32 = rng.gen();
        if sampling::decide_and_rescale(&mut s, p) {
            hits += 1;
            rescaled_sum += s as f64;
            rescaled_count += 1;
        }
        assert!((0.0..1.0).contains(&s), "rescaled sample left [0, 1): {}", s);
    }
    let frequency = hits as f64 / n as f64;
    assert!((frequency - p as f64).abs() < 0.01, "true branch frequency {}", frequency);
    let mean = rescaled_sum / rescaled_count as f64;
    assert!((mean - 0.5).abs() < 0.01, "rescaled mean {}", mean);
}

#[test]
fn decide_and_rescale_degenerate_probabilities() {
    let mut s = 0.7;
    assert!(!sampling::decide_and_rescale(&mut s, 0.0));
    assert_eq!(s, 0.7);
    assert!(!sampling::decide_and_rescale(&mut s, 1.0));
    assert_eq!(s, 0.7);
}

#[test]
fn stratified_sampler_covers_every_stratum() {
    for kind in [SamplerKind::Stratified, SamplerKind::LatinHypercube] {
        let set_size = 16;
        let mut sampler = create_sampler(kind, 99, 4, set_size);
        let mut firsts = Vec::new();
        for _ in 0..set_size {
            sampler.advance();
            firsts.push(sampler.get_1d());
        }
        firsts.sort_by(|a, b| a.partial_cmp(b).unwrap());
        for (i, v) in firsts.iter().enumerate() {
            let lo = i as f32 / set_size as f32;
            let hi = (i + 1) as f32 / set_size as f32;
            assert!(
                (lo..hi).contains(v),
                "{:?}: stratum {} not covered, got {}",
                kind,
                i,
                v
            );
        }
    }
}

#[test]
fn sampler_falls_back_to_independent_beyond_table() {
    let mut sampler = create_sampler(SamplerKind::Stratified, 5, 2, 4);
    sampler.advance();
    for _ in 0..8 {
        let v = sampler.get_1d();
        assert!((0.0..1.0).contains(&v));
    }
    assert_eq!(sampler.usage(), 8);
}

#[test]
fn sampler_wraps_to_a_fresh_set_after_exhaustion() {
    let set_size = 4;
    let mut sampler = create_sampler(SamplerKind::Stratified, 5, 2, set_size);
    let mut values = Vec::new();
    for _ in 0..set_size * 2 {
        sampler.advance();
        values.push(sampler.get_1d());
    }
    // Both sets cover the strata; values all valid.
    for v in values {
        assert!((0.0..1.0).contains(&v));
    }
}

#[test]
fn pixel_seed_is_deterministic_and_distinct() {
    assert_eq!(sampling::pixel_seed(1, 10, 20), sampling::pixel_seed(1, 10, 20));
    assert_ne!(sampling::pixel_seed(1, 10, 20), sampling::pixel_seed(1, 11, 20));
    assert_ne!(sampling::pixel_seed(1, 10, 20), sampling::pixel_seed(1, 10, 21));
    assert_ne!(sampling::pixel_seed(2, 10, 20), sampling::pixel_seed(1, 10, 20));
}
