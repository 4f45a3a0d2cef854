use std::time::Instant;

use crate::simulation::barnes_hut::QuadTree;
use crate::simulation::forces::NewtonianGravity;
use crate::simulation::params::SpaceParams;
use crate::simulation::space::Space;
use crate::simulation::states::{Body, NVec2};

/// Deterministic cloud of `n` unit-mass bodies, no rand needed
fn make_bodies(n: usize) -> Vec<Body> {
    (0..n)
        .map(|i| {
            let i_f = i as f64;
            let x = NVec2::new((i_f * 0.37).sin() * 5.0, (i_f * 0.13).cos() * 5.0);
            Body::at_rest(1.0, 1.0e-4, x)
        })
        .collect()
}

fn make_params() -> SpaceParams {
    SpaceParams {
        eps: 1.0e-2,
        theta: 0.7,
        G: 0.1,
        ..SpaceParams::default()
    }
}

/// Time one force evaluation: direct sum vs tree build + traversal
pub fn bench_gravity() {
    let ns = [200, 400, 800, 1600, 3200, 6400];
    let params = make_params();
    let eps2 = params.eps * params.eps;
    let theta2 = params.theta * params.theta;

    for n in ns {
        let bodies = make_bodies(n);
        let mut acc = vec![NVec2::zeros(); n];
        let mut phi = vec![0.0; n];

        let direct = NewtonianGravity { G: params.G, eps2 };

        // Warm up
        direct.accelerations(&bodies, &mut acc, &mut phi);

        let t0 = Instant::now();
        direct.accelerations(&bodies, &mut acc, &mut phi);
        let dt_direct = t0.elapsed().as_secs_f64();

        let t1 = Instant::now();
        let mut tree = QuadTree::build(&bodies);
        tree.update_center_of_mass(&bodies);
        let mut visits = 0;
        for i in 0..n {
            let mut a = NVec2::zeros();
            let mut p = 0.0;
            visits += tree.accumulate_gravity(&bodies, i, eps2, theta2, &mut a, &mut p);
        }
        let dt_bh = t1.elapsed().as_secs_f64();

        println!(
            "N = {n:5}, direct = {:8.6} s, BH = {:8.6} s, visits/body = {:6.1}",
            dt_direct,
            dt_bh,
            visits as f64 / n as f64
        );
    }
}

/// Time full `Space::step` calls, collisions included
pub fn bench_step() {
    let ns = [200, 400, 800, 1600, 3200, 6400, 12800];
    let steps = 2;

    for n in ns {
        let mut space = Space::with_params(make_params());
        for b in make_bodies(n) {
            space.add_body(b);
        }

        // Warm-up
        let _ = space.step(1.0e-3);

        let t0 = Instant::now();
        for _ in 0..steps {
            let _ = space.step(1.0e-3);
        }
        let per_step = t0.elapsed().as_secs_f64() / steps as f64;

        println!("N = {:5}, step = {:8.6} s, bodies after = {}", n, per_step, space.len());
    }
}
