//! The asset pipeline: the single entry point callers use per build target.

use std::path::{Path, PathBuf};

use folio_config::ResolvedTarget;
use folio_source::SourceDoc;
use tracing::{debug, info, warn};

use crate::diff::{diff, RegenRequest};
use crate::dispatch::{ConvertError, DispatchContext, Dispatcher};
use crate::error::AssetError;
use crate::fingerprint::fingerprint_source;
use crate::kind::AssetKind;
use crate::table::FingerprintTable;

/// Options controlling one asset-generation pass.
#[derive(Debug, Clone)]
pub struct GenerateOptions {
    /// Restrict the pass to these kinds; `None` means every kind relevant
    /// to the target's format.
    pub kinds: Option<Vec<AssetKind>>,
    /// Regenerate only what the fingerprint diff marks stale. Turning this
    /// off regenerates every kind present in the source; the fingerprint
    /// table is still recomputed and persisted.
    pub only_changed: bool,
    /// Ask converters for every output format they support instead of the
    /// target format's set.
    pub all_formats: bool,
    /// Restrict conversion to the subtree with this `xml:id`. Scoped runs
    /// never persist the fingerprint table: success inside one subtree says
    /// nothing about the rest of the kind.
    pub scope_id: Option<String>,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            kinds: None,
            only_changed: true,
            all_formats: false,
            scope_id: None,
        }
    }
}

/// What one asset-generation pass did.
#[derive(Debug)]
pub struct AssetReport {
    /// The regeneration requests that were dispatched, in order.
    pub requests: Vec<RegenRequest>,
    /// Requests that failed, with their errors. Failures are never fatal to
    /// the build; callers have already seen them logged.
    pub failures: Vec<(RegenRequest, ConvertError)>,
}

impl AssetReport {
    /// Whether nothing needed regeneration.
    pub fn up_to_date(&self) -> bool {
        self.requests.is_empty()
    }
}

/// Ensures every asset the target's format needs is present and current.
///
/// Invoked before the main document transform. On return, stale assets have
/// been regenerated (best-effort; individual converter failures are logged
/// and reported, not raised) and the fingerprint table is committed. Only
/// an unreadable source tree or a filesystem failure persisting the table
/// is an error.
pub fn ensure_assets_current(
    target: &ResolvedTarget,
    dispatcher: &Dispatcher,
) -> Result<AssetReport, AssetError> {
    generate_assets(target, dispatcher, &GenerateOptions::default())
}

/// Runs one asset-generation pass with explicit options.
pub fn generate_assets(
    target: &ResolvedTarget,
    dispatcher: &Dispatcher,
    options: &GenerateOptions,
) -> Result<AssetReport, AssetError> {
    let source = SourceDoc::load(&target.source)?;
    let doc = source.parse()?;

    let kinds: Vec<AssetKind> = AssetKind::ALL
        .into_iter()
        .filter(|k| k.supported_for(target.format))
        .filter(|k| options.kinds.as_ref().map_or(true, |req| req.contains(k)))
        .collect();
    debug!(build_target = %target.name, "considering asset kinds: {kinds:?}");

    let fresh = fingerprint_source(&doc, &kinds);
    let table_path = FingerprintTable::path_for(&target.generated_dir, &target.name);
    let mut committed = FingerprintTable::load(&table_path);
    committed.retain_kinds_of(&fresh);

    let requests = if options.only_changed {
        diff(&fresh, &committed)
    } else {
        fresh.iter().map(|(kind, _)| RegenRequest::all(kind)).collect()
    };

    if requests.is_empty() {
        info!(build_target = %target.name, "assets are up to date");
        if options.scope_id.is_none() {
            // Persist anyway so kinds removed from the source fall out of
            // the stored table.
            committed.save(&table_path)?;
        }
        return Ok(AssetReport {
            requests,
            failures: Vec::new(),
        });
    }
    info!(
        build_target = %target.name,
        "regenerating {} asset group(s): {}",
        requests.len(),
        requests
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    );

    for (kind, tool) in dispatcher.preflight(requests.iter().map(|r| r.kind)) {
        warn!("converter '{tool}' for {kind} not found; its assets will likely fail");
    }

    for request in &requests {
        let dir = target.generated_dir.join(request.kind.dir());
        std::fs::create_dir_all(&dir).map_err(|e| AssetError::Io {
            path: dir,
            source: e,
        })?;
    }

    let scratch = ScratchDir::create(&target.generated_dir)?;
    let report = dispatcher.dispatch(
        &requests,
        &DispatchContext {
            source: &target.source,
            publication: &target.publication,
            format: target.format,
            generated_dir: &target.generated_dir,
            scratch_dir: scratch.path(),
            all_formats: options.all_formats,
            scope_id: options.scope_id.as_deref(),
        },
    );
    drop(scratch);

    // Fold successes into the committed table. Failed requests are left
    // untouched: their entries keep the previous fingerprint (or stay
    // absent), so the next build requests them again instead of believing
    // them current.
    for request in report.succeeded() {
        match &request.id {
            None => committed.adopt_kind(request.kind, &fresh),
            Some(id) => committed.adopt_entry(request.kind, id, &fresh),
        }
    }

    if options.scope_id.is_none() {
        committed.save(&table_path)?;
    } else {
        debug!("scoped run; fingerprint table left untouched");
    }

    let failures: Vec<(RegenRequest, ConvertError)> = report
        .outcomes
        .into_iter()
        .filter_map(|(req, res)| res.err().map(|e| (req, e)))
        .collect();
    if failures.is_empty() {
        info!(build_target = %target.name, "finished generating assets");
    } else {
        warn!(
            build_target = %target.name,
            "finished generating assets with {} failure(s)",
            failures.len()
        );
    }
    Ok(AssetReport { requests, failures })
}

/// Scratch directory handed to converters, removed when dropped.
///
/// Converters are expected to write complete output files or none, but they
/// routinely leave temporaries behind; removal on drop runs on every exit
/// path out of the dispatch pass.
struct ScratchDir {
    path: PathBuf,
}

impl ScratchDir {
    fn create(generated_dir: &Path) -> Result<Self, AssetError> {
        let path = generated_dir.join(".scratch");
        std::fs::create_dir_all(&path).map_err(|e| AssetError::Io {
            path: path.clone(),
            source: e,
        })?;
        Ok(Self { path })
    }

    fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ScratchDir {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_dir_all(&self.path) {
            debug!("failed to remove scratch directory: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::{ConvertJob, Converter};
    use folio_common::DocFormat;
    use folio_config::Executables;
    use std::sync::{Arc, Mutex};

    type CallLog = Arc<Mutex<Vec<(AssetKind, Option<String>)>>>;

    struct RecordingConverter {
        calls: CallLog,
        fail: bool,
    }

    impl Converter for RecordingConverter {
        fn tool(&self) -> &str {
            "recorder"
        }

        fn convert(&self, job: &ConvertJob<'_>) -> Result<(), ConvertError> {
            self.calls
                .lock()
                .unwrap()
                .push((job.kind, job.scope_id.map(str::to_string)));
            if self.fail {
                Err(ConvertError::Unregistered { kind: job.kind })
            } else {
                Ok(())
            }
        }
    }

    struct Fixture {
        dir: tempfile::TempDir,
        calls: CallLog,
    }

    impl Fixture {
        fn new(source_xml: &str) -> Self {
            let dir = tempfile::tempdir().unwrap();
            std::fs::create_dir_all(dir.path().join("source")).unwrap();
            std::fs::write(dir.path().join("source/main.xml"), source_xml).unwrap();
            std::fs::write(dir.path().join("publication.xml"), "<publication/>").unwrap();
            Self {
                dir,
                calls: Arc::new(Mutex::new(Vec::new())),
            }
        }

        fn rewrite_source(&self, source_xml: &str) {
            std::fs::write(self.dir.path().join("source/main.xml"), source_xml).unwrap();
        }

        fn target(&self, format: DocFormat) -> ResolvedTarget {
            ResolvedTarget {
                name: "web".to_string(),
                format,
                source: self.dir.path().join("source/main.xml"),
                publication: self.dir.path().join("publication.xml"),
                output_dir: self.dir.path().join("output"),
                generated_dir: self.dir.path().join("generated-assets"),
                executables: Executables::default(),
            }
        }

        fn dispatcher(&self, failing: &[AssetKind]) -> Dispatcher {
            let mut dispatcher = Dispatcher::from_executables(&Executables::default());
            for kind in AssetKind::ALL {
                dispatcher = dispatcher.with_converter(
                    kind,
                    Box::new(RecordingConverter {
                        calls: Arc::clone(&self.calls),
                        fail: failing.contains(&kind),
                    }),
                );
            }
            dispatcher
        }

        fn calls(&self) -> Vec<(AssetKind, Option<String>)> {
            self.calls.lock().unwrap().clone()
        }

        fn clear_calls(&self) {
            self.calls.lock().unwrap().clear();
        }
    }

    const ONE_ID_TWO_ANON: &str = r#"<book>
  <plot xml:id="p1">A</plot>
  <plot>B</plot>
  <plot>C</plot>
</book>"#;

    #[test]
    fn idempotence_second_run_invokes_nothing() {
        let fx = Fixture::new(ONE_ID_TWO_ANON);
        let target = fx.target(DocFormat::Html);
        let dispatcher = fx.dispatcher(&[]);

        let first = ensure_assets_current(&target, &dispatcher).unwrap();
        assert!(!first.up_to_date());
        fx.clear_calls();

        let second = ensure_assets_current(&target, &dispatcher).unwrap();
        assert!(second.up_to_date());
        assert!(fx.calls().is_empty(), "no converter invocations on rerun");
    }

    #[test]
    fn first_build_regenerates_kind_in_full() {
        let fx = Fixture::new(ONE_ID_TWO_ANON);
        let target = fx.target(DocFormat::Html);
        let dispatcher = fx.dispatcher(&[]);

        let report = ensure_assets_current(&target, &dispatcher).unwrap();
        // First appearance has no baseline: one regenerate-all for the kind.
        assert_eq!(report.requests, vec![RegenRequest::all(AssetKind::Plot)]);
        assert_eq!(fx.calls(), vec![(AssetKind::Plot, None)]);
    }

    #[test]
    fn sensitivity_one_identified_change_one_request() {
        let fx = Fixture::new(ONE_ID_TWO_ANON);
        let target = fx.target(DocFormat::Html);
        let dispatcher = fx.dispatcher(&[]);
        ensure_assets_current(&target, &dispatcher).unwrap();
        fx.clear_calls();

        fx.rewrite_source(
            r#"<book>
  <plot xml:id="p1">A-prime</plot>
  <plot>B</plot>
  <plot>C</plot>
</book>"#,
        );
        let report = ensure_assets_current(&target, &dispatcher).unwrap();
        assert_eq!(report.requests, vec![RegenRequest::one(AssetKind::Plot, "p1")]);
        assert_eq!(fx.calls(), vec![(AssetKind::Plot, Some("p1".to_string()))]);
    }

    #[test]
    fn bucket_coarseness_anon_change_regenerates_all() {
        let fx = Fixture::new("<book><plot>A</plot><plot>B</plot></book>");
        let target = fx.target(DocFormat::Html);
        let dispatcher = fx.dispatcher(&[]);
        ensure_assets_current(&target, &dispatcher).unwrap();
        fx.clear_calls();

        fx.rewrite_source("<book><plot>A</plot><plot>B-changed</plot></book>");
        let report = ensure_assets_current(&target, &dispatcher).unwrap();
        assert_eq!(report.requests, vec![RegenRequest::all(AssetKind::Plot)]);
    }

    #[test]
    fn first_appearance_of_new_kind_regenerates_it_only() {
        let fx = Fixture::new("<book><plot>A</plot></book>");
        let target = fx.target(DocFormat::Html);
        let dispatcher = fx.dispatcher(&[]);
        ensure_assets_current(&target, &dispatcher).unwrap();
        fx.clear_calls();

        fx.rewrite_source("<book><plot>A</plot><diagram>D</diagram></book>");
        let report = ensure_assets_current(&target, &dispatcher).unwrap();
        assert_eq!(report.requests, vec![RegenRequest::all(AssetKind::Diagram)]);
        assert_eq!(fx.calls(), vec![(AssetKind::Diagram, None)]);
    }

    #[test]
    fn failure_isolation_failed_entry_retried_next_build() {
        let fx = Fixture::new("<book><plot>A</plot><diagram>D</diagram></book>");
        let target = fx.target(DocFormat::Html);

        // First build: diagram converter fails, plot succeeds.
        let failing = fx.dispatcher(&[AssetKind::Diagram]);
        let report = ensure_assets_current(&target, &failing).unwrap();
        assert_eq!(report.requests.len(), 2);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].0.kind, AssetKind::Diagram);
        fx.clear_calls();

        // Second build, nothing changed: only the failed kind is retried.
        let healthy = fx.dispatcher(&[]);
        let report = ensure_assets_current(&target, &healthy).unwrap();
        assert_eq!(report.requests, vec![RegenRequest::all(AssetKind::Diagram)]);
        assert!(report.failures.is_empty());
        fx.clear_calls();

        // Third build: everything is current.
        let report = ensure_assets_current(&target, &healthy).unwrap();
        assert!(report.up_to_date());
    }

    #[test]
    fn failed_regenerate_one_keeps_stale_fingerprint() {
        let fx = Fixture::new(ONE_ID_TWO_ANON);
        let target = fx.target(DocFormat::Html);
        let healthy = fx.dispatcher(&[]);
        ensure_assets_current(&target, &healthy).unwrap();

        // Change p1; the scoped regeneration fails.
        fx.rewrite_source(
            r#"<book>
  <plot xml:id="p1">A-prime</plot>
  <plot>B</plot>
  <plot>C</plot>
</book>"#,
        );
        let failing = fx.dispatcher(&[AssetKind::Plot]);
        let report = ensure_assets_current(&target, &failing).unwrap();
        assert_eq!(report.failures.len(), 1);
        fx.clear_calls();

        // The failed entry stayed stale, so it is requested again.
        let report = ensure_assets_current(&target, &healthy).unwrap();
        assert_eq!(report.requests, vec![RegenRequest::one(AssetKind::Plot, "p1")]);
    }

    #[test]
    fn concrete_scenario_third_build_updates_only_p1() {
        let fx = Fixture::new(ONE_ID_TWO_ANON);
        let target = fx.target(DocFormat::Html);
        let dispatcher = fx.dispatcher(&[]);

        // First build fills the table.
        ensure_assets_current(&target, &dispatcher).unwrap();
        let table_path = FingerprintTable::path_for(&target.generated_dir, "web");
        let after_first = FingerprintTable::load(&table_path);
        assert!(after_first.get(AssetKind::Plot, "p1").is_some());
        assert!(after_first.get(AssetKind::Plot, "").is_some());

        // Second build: no changes, no invocations.
        fx.clear_calls();
        ensure_assets_current(&target, &dispatcher).unwrap();
        assert!(fx.calls().is_empty());

        // Third build: p1 changed; exactly one scoped invocation, and only
        // that table entry moves.
        fx.rewrite_source(
            r#"<book>
  <plot xml:id="p1">A-prime</plot>
  <plot>B</plot>
  <plot>C</plot>
</book>"#,
        );
        ensure_assets_current(&target, &dispatcher).unwrap();
        assert_eq!(fx.calls(), vec![(AssetKind::Plot, Some("p1".to_string()))]);
        let after_third = FingerprintTable::load(&table_path);
        assert_ne!(
            after_first.get(AssetKind::Plot, "p1"),
            after_third.get(AssetKind::Plot, "p1")
        );
        assert_eq!(
            after_first.get(AssetKind::Plot, ""),
            after_third.get(AssetKind::Plot, "")
        );
    }

    #[test]
    fn removed_kind_pruned_from_persisted_table() {
        let fx = Fixture::new("<book><plot>A</plot><diagram>D</diagram></book>");
        let target = fx.target(DocFormat::Html);
        let dispatcher = fx.dispatcher(&[]);
        ensure_assets_current(&target, &dispatcher).unwrap();

        fx.rewrite_source("<book><plot>A</plot></book>");
        let report = ensure_assets_current(&target, &dispatcher).unwrap();
        assert!(report.up_to_date(), "removing a kind triggers nothing");
        let table = FingerprintTable::load(&FingerprintTable::path_for(
            &target.generated_dir,
            "web",
        ));
        assert!(table.entries(AssetKind::Diagram).is_none());
        assert!(table.entries(AssetKind::Plot).is_some());
    }

    #[test]
    fn format_restricts_kinds() {
        let fx = Fixture::new(r#"<book><plot>A</plot><interactive src="sim.html"/></book>"#);
        let dispatcher = fx.dispatcher(&[]);

        // HTML build: interactive previews are skipped.
        let report = ensure_assets_current(&fx.target(DocFormat::Html), &dispatcher).unwrap();
        assert_eq!(report.requests, vec![RegenRequest::all(AssetKind::Plot)]);
    }

    #[test]
    fn scoped_run_does_not_persist_table() {
        let fx = Fixture::new(ONE_ID_TWO_ANON);
        let target = fx.target(DocFormat::Html);
        let dispatcher = fx.dispatcher(&[]);
        let options = GenerateOptions {
            scope_id: Some("p1".to_string()),
            ..GenerateOptions::default()
        };
        generate_assets(&target, &dispatcher, &options).unwrap();
        let table_path = FingerprintTable::path_for(&target.generated_dir, "web");
        assert!(!table_path.exists());
    }

    #[test]
    fn force_regenerates_everything_present() {
        let fx = Fixture::new("<book><plot>A</plot><diagram>D</diagram></book>");
        let target = fx.target(DocFormat::Html);
        let dispatcher = fx.dispatcher(&[]);
        ensure_assets_current(&target, &dispatcher).unwrap();
        fx.clear_calls();

        let options = GenerateOptions {
            only_changed: false,
            ..GenerateOptions::default()
        };
        let report = generate_assets(&target, &dispatcher, &options).unwrap();
        assert_eq!(report.requests.len(), 2);
        assert!(report.requests.iter().all(RegenRequest::is_all));
    }

    #[test]
    fn requested_kinds_restrict_the_pass() {
        let fx = Fixture::new("<book><plot>A</plot><diagram>D</diagram></book>");
        let target = fx.target(DocFormat::Html);
        let dispatcher = fx.dispatcher(&[]);
        let options = GenerateOptions {
            kinds: Some(vec![AssetKind::Diagram]),
            ..GenerateOptions::default()
        };
        let report = generate_assets(&target, &dispatcher, &options).unwrap();
        assert_eq!(report.requests, vec![RegenRequest::all(AssetKind::Diagram)]);
    }

    #[test]
    fn per_kind_directories_created() {
        let fx = Fixture::new("<book><plot>A</plot></book>");
        let target = fx.target(DocFormat::Html);
        let dispatcher = fx.dispatcher(&[]);
        ensure_assets_current(&target, &dispatcher).unwrap();
        assert!(target.generated_dir.join("plot").is_dir());
    }

    #[test]
    fn scratch_directory_removed_after_pass() {
        let fx = Fixture::new("<book><plot>A</plot></book>");
        let target = fx.target(DocFormat::Html);
        let dispatcher = fx.dispatcher(&[]);
        ensure_assets_current(&target, &dispatcher).unwrap();
        assert!(!target.generated_dir.join(".scratch").exists());
    }

    #[test]
    fn unreadable_source_is_an_error() {
        let fx = Fixture::new("<book/>");
        let mut target = fx.target(DocFormat::Html);
        target.source = fx.dir.path().join("missing.xml");
        let dispatcher = fx.dispatcher(&[]);
        let err = ensure_assets_current(&target, &dispatcher).unwrap_err();
        assert!(matches!(err, AssetError::Source(_)));
    }

    #[test]
    fn malformed_source_is_an_error() {
        let fx = Fixture::new("<book><plot></book>");
        let target = fx.target(DocFormat::Html);
        let dispatcher = fx.dispatcher(&[]);
        let err = ensure_assets_current(&target, &dispatcher).unwrap_err();
        assert!(matches!(err, AssetError::Source(_)));
    }

    #[test]
    fn corrupt_table_triggers_full_regeneration() {
        let fx = Fixture::new(ONE_ID_TWO_ANON);
        let target = fx.target(DocFormat::Html);
        let dispatcher = fx.dispatcher(&[]);
        ensure_assets_current(&target, &dispatcher).unwrap();
        fx.clear_calls();

        let table_path = FingerprintTable::path_for(&target.generated_dir, "web");
        std::fs::write(&table_path, b"corrupted beyond recognition").unwrap();
        let report = ensure_assets_current(&target, &dispatcher).unwrap();
        assert_eq!(report.requests, vec![RegenRequest::all(AssetKind::Plot)]);
    }
}
