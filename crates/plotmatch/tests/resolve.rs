use std::path::Path;

use plotmatch::{
    EpisodeId, NormalizerConfig, Outcome, PlotMatchError, RawPlot, Resolver, ResolverConfig,
    SeriesName, SyncAction, TsvPlotSource,
};
use tempfile::TempDir;

const E1: &str = "A detective investigates a murder at a mansion.";
const E2: &str = "A chef competes in a cooking contest.";

fn series() -> SeriesName {
    SeriesName::new("Mystery Hour").unwrap()
}

fn workdir_with_corpus() -> (TempDir, Resolver) {
    let dir = tempfile::tempdir().unwrap();
    let resolver = Resolver::new(dir.path(), ResolverConfig::default()).unwrap();
    let plots = vec![RawPlot::new("E1", E1), RawPlot::new("E2", E2)];
    resolver.ingest(&series(), &plots).unwrap();
    (dir, resolver)
}

fn matched(outcome: Outcome) -> plotmatch::MatchResult {
    match outcome {
        Outcome::Matched(result) => result,
        other => panic!("expected a match, got {other:?}"),
    }
}

fn log_lines(resolver: &Resolver) -> Vec<String> {
    let path = resolver.paths(&series()).result_log;
    std::fs::read_to_string(path)
        .unwrap()
        .lines()
        .map(str::to_string)
        .collect()
}

#[test]
fn paraphrased_plot_resolves_to_the_right_episode() {
    let (_dir, resolver) = workdir_with_corpus();

    let result = matched(
        resolver
            .resolve(&series(), Some("A sleuth solves a killing in a large house."))
            .unwrap(),
    );

    assert_eq!(result.episode_id.as_ref().map(EpisodeId::as_str), Some("E1"));
    assert!(result.quality > 0.5, "quality {}", result.quality);
    assert!((0.0..=1.0).contains(&result.quality));
}

#[test]
fn empty_plot_resolves_to_none_at_neutral_quality() {
    let (_dir, resolver) = workdir_with_corpus();

    let result = matched(resolver.resolve(&series(), Some("")).unwrap());
    assert_eq!(result.episode_id, None);
    assert_eq!(result.quality, 0.5);
    assert_eq!(log_lines(&resolver), ["NONE 0.5000 "]);
}

#[test]
fn unknown_series_has_no_candidates() {
    let dir = tempfile::tempdir().unwrap();
    let resolver = Resolver::new(dir.path(), ResolverConfig::default()).unwrap();

    let result = matched(resolver.resolve(&series(), Some(E1)).unwrap());
    assert_eq!(result.episode_id, None);
    assert_eq!(result.quality, 0.0);
}

#[test]
fn refresh_without_plot_reports_training() {
    let (_dir, resolver) = workdir_with_corpus();

    let outcome = resolver.resolve(&series(), None).unwrap();
    assert_eq!(
        outcome,
        Outcome::Trained {
            series: series(),
            version: 1,
            episodes: 2,
        }
    );
    assert!(!resolver.paths(&series()).result_log.exists());
}

#[test]
fn result_log_is_append_only() {
    let (_dir, resolver) = workdir_with_corpus();

    resolver.resolve(&series(), Some(E2)).unwrap();
    resolver.resolve(&series(), Some(E1)).unwrap();

    let lines = log_lines(&resolver);
    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with("E2 "), "{}", lines[0]);
    assert!(lines[1].starts_with("E1 "), "{}", lines[1]);
    assert!(lines[1].ends_with("detectiv investigat murder mansion"));
}

#[test]
fn reingesting_the_same_plots_changes_nothing() {
    let (_dir, resolver) = workdir_with_corpus();
    let plots = vec![RawPlot::new("E1", E1), RawPlot::new("E2", E2)];

    let again = resolver.ingest(&series(), &plots).unwrap();
    assert_eq!(again.added, 0);
    assert_eq!(again.duplicates, 2);
    assert_eq!(again.corpus.version, 1);
}

#[test]
fn sync_settles_on_the_corpus_version() {
    let (_dir, resolver) = workdir_with_corpus();

    let first = resolver.refresh(&series()).unwrap();
    assert_eq!(first.action, SyncAction::FullTrain);
    for _ in 0..3 {
        let next = resolver.refresh(&series()).unwrap();
        assert_eq!(next.action, SyncAction::UpToDate);
        assert_eq!(next.model.trained_version, first.model.trained_version);
    }

    resolver
        .ingest(
            &series(),
            &vec![RawPlot::new("E3", "Pirates bury treasure on a remote island.")],
        )
        .unwrap();
    let grown = resolver.refresh(&series()).unwrap();
    assert_eq!(grown.action, SyncAction::Incremental { documents: 1 });
    assert_eq!(grown.model.trained_version, 2);
}

#[test]
fn independent_trainings_rank_identically() {
    let (_a, first) = workdir_with_corpus();
    let (_b, second) = workdir_with_corpus();
    let query = "A cook enters a baking championship.";

    let a = first.refresh(&series()).unwrap().model;
    let b = second.refresh(&series()).unwrap().model;
    let matcher = plotmatch::Matcher::new(
        plotmatch::Normalizer::new(NormalizerConfig::default()).unwrap(),
    );
    assert_eq!(matcher.rank(query, &a).unwrap(), matcher.rank(query, &b).unwrap());
}

#[test]
fn changed_normalizer_is_a_config_mismatch() {
    let (dir, resolver) = workdir_with_corpus();
    resolver.resolve(&series(), None).unwrap();

    let config = ResolverConfig::default()
        .with_normalizer(NormalizerConfig::default().with_remove_stopwords(false));
    let other = Resolver::new(dir.path(), config).unwrap();

    let err = other.resolve(&series(), Some(E1)).unwrap_err();
    assert!(matches!(err, PlotMatchError::ConfigMismatch { .. }));
    assert_eq!(err.exit_code(), 4);

    // the saved model survives and still serves the first configuration
    let result = matched(resolver.resolve(&series(), Some(E1)).unwrap());
    assert_eq!(result.episode_id.as_ref().map(EpisodeId::as_str), Some("E1"));

    // discarding lets the new configuration retrain
    assert!(other.discard_model(&series()).unwrap());
    let result = matched(other.resolve(&series(), Some(E1)).unwrap());
    assert_eq!(result.episode_id.as_ref().map(EpisodeId::as_str), Some("E1"));
}

#[test]
fn plots_are_read_from_a_tsv_file() {
    let dir = tempfile::tempdir().unwrap();
    let tsv = dir.path().join("plots.tsv");
    std::fs::write(
        &tsv,
        format!("# canonical plots\nS01E01\t{E1}\nS01E02\t{E2}\nbroken line\n"),
    )
    .unwrap();

    let resolver = Resolver::new(dir.path(), ResolverConfig::default()).unwrap();
    let outcome = resolver.ingest(&series(), &TsvPlotSource::new(&tsv)).unwrap();
    assert_eq!(outcome.added, 2);
    assert_eq!(outcome.rejected.len(), 1);

    let result = matched(resolver.resolve(&series(), Some(E2)).unwrap());
    assert_eq!(result.episode_id.as_ref().map(EpisodeId::as_str), Some("S01E02"));
}

#[test]
fn corrupt_model_fails_without_touching_it() {
    let (_dir, resolver) = workdir_with_corpus();
    let model_path = resolver.paths(&series()).model;
    std::fs::create_dir_all(model_path.parent().unwrap()).unwrap();
    std::fs::write(&model_path, b"garbage").unwrap();

    let err = resolver.resolve(&series(), Some(E1)).unwrap_err();
    assert!(matches!(err, PlotMatchError::Persistence { .. }));
    assert_eq!(err.exit_code(), 3);
    assert_eq!(std::fs::read(&model_path).unwrap(), b"garbage");
}

#[test]
fn series_state_lives_under_its_own_directory() {
    let (dir, resolver) = workdir_with_corpus();
    resolver.resolve(&series(), Some(E1)).unwrap();

    let series_dir = dir.path().join("Mystery Hour");
    for file in ["corpus.sqlite", "model.json", "AbsoluteEpisodeNumberFromPlot.txt"] {
        assert!(Path::new(&series_dir).join(file).is_file(), "{file}");
    }
}
