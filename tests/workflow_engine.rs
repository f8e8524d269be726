//! End-to-end workflow scenarios against real stores, real templates, and a
//! recording fake of the container runtime.

use std::cell::RefCell;
use std::fs;

use tempfile::TempDir;

use certo::application::{Intent, WorkflowEngine};
use certo::domain::{
    DomainEntry, DomainName, GlobalSettings, Registry, RequestHandler, Upstream,
};
use certo::infrastructure::compose::{CommandOutcome, ComposeRuntime};
use certo::infrastructure::nginx::{ConfigFileWriter, TemplateRenderer};
use certo::infrastructure::paths::ProjectPaths;
use certo::infrastructure::store::ConfigStore;

struct RecordingRuntime {
    live: bool,
    failing: Vec<&'static str>,
    calls: RefCell<Vec<String>>,
}

impl RecordingRuntime {
    fn live() -> Self {
        Self {
            live: true,
            failing: Vec::new(),
            calls: RefCell::new(Vec::new()),
        }
    }

    fn down() -> Self {
        Self {
            live: false,
            ..Self::live()
        }
    }

    fn failing_on(step: &'static str) -> Self {
        Self {
            failing: vec![step],
            ..Self::live()
        }
    }

    fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    fn record(&self, call: &str) -> CommandOutcome {
        self.calls.borrow_mut().push(call.to_string());
        let ok = !self.failing.iter().any(|step| call.starts_with(step));
        CommandOutcome {
            ok,
            output: String::new(),
            error: (!ok).then(|| "exit status: 1".to_string()),
        }
    }
}

impl ComposeRuntime for RecordingRuntime {
    fn is_web_server_live(&self) -> bool {
        self.live
    }

    fn reload(&self) -> CommandOutcome {
        self.record("reload")
    }

    fn apply_placeholder_certificate(&self) -> CommandOutcome {
        self.record("placeholder")
    }

    fn issue_certificate(&self) -> CommandOutcome {
        self.record("issue")
    }

    fn revoke_certificate(&self, domain: &DomainName) -> CommandOutcome {
        self.record(&format!("revoke {}", domain))
    }

    fn force_renew_all(&self) -> CommandOutcome {
        self.record("force-renew")
    }
}

struct Harness {
    _dir: TempDir,
    store: ConfigStore,
    renderer: TemplateRenderer,
    writer: ConfigFileWriter,
}

impl Harness {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let paths = ProjectPaths::new(dir.path());
        Self {
            store: ConfigStore::new(paths.registry_file.clone()),
            renderer: TemplateRenderer::new().unwrap(),
            writer: ConfigFileWriter::new(&paths),
            _dir: dir,
        }
    }

    fn engine<'a>(&'a self, runtime: &'a RecordingRuntime) -> WorkflowEngine<'a> {
        WorkflowEngine::new(&self.store, &self.renderer, &self.writer, runtime)
    }
}

fn name(s: &str) -> DomainName {
    DomainName::new(s).unwrap()
}

fn static_entry(domain: &str) -> DomainEntry {
    DomainEntry {
        domain: name(domain),
        email: None,
        www_subdomain: true,
        test_cert: true,
        rsa_key_size: 4096,
        handler: RequestHandler::StaticContent,
    }
}

fn proxy_entry(domain: &str) -> DomainEntry {
    DomainEntry {
        domain: name(domain),
        email: None,
        www_subdomain: false,
        test_cert: true,
        rsa_key_size: 2048,
        handler: RequestHandler::ReverseProxy {
            upstream: Upstream::new("backend:8080").unwrap(),
            dns_resolver: Some("127.0.0.11".to_string()),
            websockets: false,
        },
    }
}

#[test]
fn init_writes_registry_and_artifacts_without_orchestrator_calls() {
    let harness = Harness::new();
    let runtime = RecordingRuntime::live();
    let engine = harness.engine(&runtime);

    let intent = Intent::Init {
        settings: GlobalSettings::default(),
        domains: vec![static_entry("example.com")],
    };
    let proposed = engine.propose(intent, &Registry::default()).unwrap();
    let (next, report) = engine.commit(proposed).unwrap();

    assert!(report.succeeded());
    assert_eq!(next.domains.len(), 1);
    assert_eq!(harness.store.load(), next);
    assert!(harness.writer.global_path().exists());
    assert!(harness.writer.domain_path(&name("example.com")).exists());
    assert!(runtime.calls().is_empty());
}

#[test]
fn add_domains_runs_placeholder_issue_reload_in_order() {
    let harness = Harness::new();
    let mut current = Registry::default();
    current.add(static_entry("example.com")).unwrap();
    harness.store.save(&current).unwrap();

    let runtime = RecordingRuntime::live();
    let engine = harness.engine(&runtime);

    let proposed = engine
        .propose(Intent::AddDomains(vec![proxy_entry("api.example.com")]), &current)
        .unwrap();
    let (next, report) = engine.commit(proposed).unwrap();

    assert!(report.succeeded());
    assert_eq!(next.domains.len(), 2);
    assert_eq!(runtime.calls(), vec!["placeholder", "issue", "reload"]);
    assert!(harness.writer.domain_path(&name("api.example.com")).exists());
}

#[test]
fn duplicate_add_is_rejected_before_any_side_effect() {
    let harness = Harness::new();
    let mut current = Registry::default();
    current.add(static_entry("example.com")).unwrap();
    harness.store.save(&current).unwrap();

    let runtime = RecordingRuntime::live();
    let engine = harness.engine(&runtime);

    let err = engine.propose(Intent::AddDomains(vec![static_entry("example.com")]), &current);
    assert!(err.is_err());
    assert_eq!(harness.store.load(), current);
    assert!(runtime.calls().is_empty());
}

#[test]
fn promotion_flips_test_cert_and_sequences_revoke_placeholder_issue_reload() {
    let harness = Harness::new();
    let mut current = Registry::default();
    current.add(static_entry("example.com")).unwrap();
    current.add(static_entry("other.example.com")).unwrap();
    harness.store.save(&current).unwrap();

    let runtime = RecordingRuntime::live();
    let engine = harness.engine(&runtime);

    let proposed = engine
        .propose(Intent::PromoteToProduction(name("example.com")), &current)
        .unwrap();
    let (next, report) = engine.commit(proposed).unwrap();

    assert!(report.succeeded());
    assert!(!next.find(&name("example.com")).unwrap().test_cert);
    // The sibling domain is untouched.
    assert!(next.find(&name("other.example.com")).unwrap().test_cert);
    assert_eq!(
        runtime.calls(),
        vec!["revoke example.com", "placeholder", "issue", "reload"]
    );
    // Only the promoted domain's artifact was (re)written.
    assert!(harness.writer.domain_path(&name("example.com")).exists());
    assert!(!harness.writer.domain_path(&name("other.example.com")).exists());
}

#[test]
fn removal_deletes_artifact_reloads_then_revokes_and_spares_siblings() {
    let harness = Harness::new();
    let mut current = Registry::default();
    current.add(static_entry("old.example.com")).unwrap();
    current.add(static_entry("keep.example.com")).unwrap();
    harness.store.save(&current).unwrap();

    harness
        .writer
        .write_domain(&name("old.example.com"), "server {}\n")
        .unwrap();
    harness
        .writer
        .write_domain(&name("keep.example.com"), "# sentinel\n")
        .unwrap();

    let runtime = RecordingRuntime::live();
    let engine = harness.engine(&runtime);

    let proposed = engine
        .propose(Intent::RemoveDomain(name("old.example.com")), &current)
        .unwrap();
    let (next, report) = engine.commit(proposed).unwrap();

    assert!(report.succeeded());
    assert_eq!(next.domains.len(), 1);
    assert_eq!(harness.store.load(), next);
    assert!(!harness.writer.domain_path(&name("old.example.com")).exists());
    assert_eq!(runtime.calls(), vec!["reload", "revoke old.example.com"]);

    // The surviving domain's artifact was not rewritten.
    let sentinel =
        fs::read_to_string(harness.writer.domain_path(&name("keep.example.com"))).unwrap();
    assert_eq!(sentinel, "# sentinel\n");
}

#[test]
fn removal_with_missing_artifact_is_already_satisfied() {
    let harness = Harness::new();
    let mut current = Registry::default();
    current.add(static_entry("old.example.com")).unwrap();
    harness.store.save(&current).unwrap();

    let runtime = RecordingRuntime::live();
    let engine = harness.engine(&runtime);

    let proposed = engine
        .propose(Intent::RemoveDomain(name("old.example.com")), &current)
        .unwrap();
    let (_, report) = engine.commit(proposed).unwrap();

    // Racing with manual cleanup is not a failure.
    assert!(report.succeeded());
    assert_eq!(runtime.calls(), vec!["reload", "revoke old.example.com"]);
}

#[test]
fn dropping_an_unconfirmed_proposal_changes_nothing() {
    let harness = Harness::new();
    let mut current = Registry::default();
    current.add(static_entry("example.com")).unwrap();
    harness.store.save(&current).unwrap();

    let runtime = RecordingRuntime::live();
    let engine = harness.engine(&runtime);

    let before = harness.store.load();
    let proposed = engine
        .propose(Intent::RemoveDomain(name("example.com")), &current)
        .unwrap();
    drop(proposed);

    assert_eq!(harness.store.load(), before);
    assert!(runtime.calls().is_empty());
    assert!(!harness.writer.global_path().exists());
}

#[test]
fn force_renew_continues_past_a_failed_step_and_reports_failure() {
    let harness = Harness::new();
    let mut current = Registry::default();
    current.add(static_entry("example.com")).unwrap();
    harness.store.save(&current).unwrap();

    let runtime = RecordingRuntime::failing_on("force-renew");
    let engine = harness.engine(&runtime);

    let proposed = engine.propose(Intent::ForceRenewAll, &current).unwrap();
    let (_, report) = engine.commit(proposed).unwrap();

    // The failed renewal does not stop the reload, but the intent is
    // reported as failed.
    assert_eq!(runtime.calls(), vec!["force-renew", "reload"]);
    assert!(!report.succeeded());
}

#[test]
fn edit_settings_regenerates_everything_and_reloads() {
    let harness = Harness::new();
    let mut current = Registry::default();
    current.add(static_entry("example.com")).unwrap();
    current.add(proxy_entry("api.example.com")).unwrap();
    harness.store.save(&current).unwrap();

    let runtime = RecordingRuntime::live();
    let engine = harness.engine(&runtime);

    let settings = GlobalSettings {
        dhparams_size: 4096,
        gzip: false,
    };
    let proposed = engine
        .propose(Intent::EditSettings(settings.clone()), &current)
        .unwrap();
    let (next, report) = engine.commit(proposed).unwrap();

    assert!(report.succeeded());
    assert_eq!(next.settings, settings);
    assert_eq!(runtime.calls(), vec!["reload"]);
    assert!(harness.writer.domain_path(&name("example.com")).exists());
    assert!(harness.writer.domain_path(&name("api.example.com")).exists());

    let global = fs::read_to_string(harness.writer.global_path()).unwrap();
    assert!(global.contains("4096-bit"));
    assert!(!global.contains("gzip on;"));
}

#[test]
fn guard_refuses_when_web_server_is_down() {
    let harness = Harness::new();
    let mut current = Registry::default();
    current.add(static_entry("example.com")).unwrap();
    harness.store.save(&current).unwrap();

    let runtime = RecordingRuntime::down();
    let engine = harness.engine(&runtime);

    assert!(engine.ensure_web_server_live().is_err());
    // Nothing was proposed or committed; durable state is untouched.
    assert_eq!(harness.store.load(), current);
    assert!(runtime.calls().is_empty());
}

#[test]
fn reload_intent_touches_no_files() {
    let harness = Harness::new();
    let mut current = Registry::default();
    current.add(static_entry("example.com")).unwrap();
    harness.store.save(&current).unwrap();

    let runtime = RecordingRuntime::live();
    let engine = harness.engine(&runtime);

    let proposed = engine.propose(Intent::Reload, &current).unwrap();
    let (_, report) = engine.commit(proposed).unwrap();

    assert!(report.succeeded());
    assert_eq!(runtime.calls(), vec!["reload"]);
    assert!(!harness.writer.global_path().exists());
}
