use criterion::*;
use ndarray::Array2;
use thermal_view::{
    legend::build_gradient,
    normalize::normalize_with_stats,
    palette::apply_palette,
    DisplayUnit, MemoryDocument, Palette, RawFrame, Session,
};

pub struct Samples<T>(Vec<T>);
impl<T> Samples<T> {
    pub fn sampler<'a>(&'a self) -> impl FnMut() -> &'a T {
        let mut curr = 0;
        move || {
            let ret = curr;
            curr += 1;
            curr %= self.0.len();
            &self.0[ret]
        }
    }
    pub fn from_fn<F: FnMut(usize) -> T>(size: usize, proc: F) -> Self {
        Self((0..size).map(proc).collect())
    }
}

/// 640x512 frames with a moving hot spot.
fn frame(seed: usize) -> Array2<f64> {
    Array2::from_shape_fn((512, 640), |(r, c)| {
        let dx = c as f64 - (seed * 37 % 640) as f64;
        let dy = r as f64 - (seed * 53 % 512) as f64;
        14000. + 2000. * (-(dx * dx + dy * dy) / 5000.).exp()
    })
}

fn rendering(c: &mut Criterion) {
    let frames = Samples::from_fn(8, |i| {
        RawFrame::new(frame(i), DisplayUnit::Counts).expect("finite")
    });

    c.bench_function("normalize", |b| {
        let mut next = frames.sampler();
        b.iter(|| normalize_with_stats(next()))
    });

    c.bench_function("apply_palette", |b| {
        let indices = Samples::from_fn(8, |i| normalize_with_stats(&frames.0[i]).0);
        let mut next = indices.sampler();
        b.iter(|| apply_palette(next(), Palette::Ironbow))
    });

    c.bench_function("legend_gradient", |b| {
        b.iter(|| build_gradient(black_box(500), black_box(30), Palette::Jet))
    });

    c.bench_function("session_tick", |b| {
        let doc = MemoryDocument::new((0..8).map(frame).collect()).expect("frames");
        let mut session = Session::default();
        session.open_document(Box::new(doc)).expect("open");
        session.toggle_play().expect("play");
        b.iter(|| session.tick().expect("tick"))
    });
}

criterion_group! {
    name = benches;
    config = Criterion::default().sample_size(20);
    targets = rendering
}

criterion_main!(benches);
