use criterion::{Criterion, black_box, criterion_group, criterion_main};
use plotmatch_core::{
    EmbeddingModel, EpisodeId, Hyperparameters, Matcher, Normalizer, NormalizerConfig,
    PlotDocument, SeriesName,
};

const PLOTS: &[&str] = &[
    "A detective investigates a murder at a mansion.",
    "A chef competes in a cooking contest.",
    "The vicar is found dead in the church after the village fete.",
    "Two brothers fall out over their late father's inheritance.",
    "A young nurse uncovers a poisoning scheme at the hospital.",
    "A bride vanishes on the morning of her wedding.",
    "An old farmer refuses to sell his land to developers.",
    "A ghost is said to haunt the castle's east wing.",
];

fn corpus(normalizer: &Normalizer) -> Vec<PlotDocument> {
    (0..60)
        .map(|i| {
            let text = format!("{} Episode {i}.", PLOTS[i % PLOTS.len()]);
            PlotDocument {
                episode_id: EpisodeId::parse(format!("S{:02}E{:02}", i / 12 + 1, i % 12 + 1)).unwrap(),
                clean_tokens: normalizer.normalize(&text),
                raw_text: text,
                added_in: 1,
            }
        })
        .collect()
}

fn bench_matcher(c: &mut Criterion) {
    let normalizer = Normalizer::new(NormalizerConfig::default()).unwrap();
    let docs = corpus(&normalizer);
    let series = SeriesName::new("Bench").unwrap();

    c.bench_function("train_60_episodes", |b| {
        b.iter(|| {
            let mut model =
                EmbeddingModel::new(series.clone(), Hyperparameters::default(), &normalizer).unwrap();
            model.train(black_box(&docs));
        });
    });

    let mut model = EmbeddingModel::new(series, Hyperparameters::default(), &normalizer).unwrap();
    model.train(&docs);
    let matcher = Matcher::new(normalizer);

    c.bench_function("closest_match_60_episodes", |b| {
        b.iter(|| {
            matcher
                .closest_match(black_box("A sleuth solves a killing in a large house."), &model)
                .unwrap()
        });
    });
}

criterion_group!(benches, bench_matcher);
criterion_main!(benches);
