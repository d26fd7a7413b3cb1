//! Path layer tests: layout, normalization, safety checks, accessor.

use std::collections::HashMap;
use std::sync::Arc;

use sbx_core::safety::{is_within, normalize_absolute, resolve_lexically, workspace_relative};
use sbx_core::*;

fn config(mode: ProviderMode) -> WorkspaceConfig {
    WorkspaceConfig::new(BaseRoot::new("/workspace").unwrap(), mode)
}

fn pid(id: &str) -> ProjectId {
    ProjectId::new(id).unwrap()
}

const MODES: [ProviderMode; 2] = [ProviderMode::SharedRoot, ProviderMode::PerProjectRoot];

// ─────────────────────────────────────────────────────────────────────────────
// Segment helpers
// ─────────────────────────────────────────────────────────────────────────────

mod segments {
    use super::*;

    #[test]
    fn normalize_collapses_dots_and_separators() {
        assert_eq!(normalize_absolute("//a/./b///c/../d/"), "/a/b/d");
        assert_eq!(normalize_absolute("/../../x"), "/x");
        assert_eq!(normalize_absolute(""), "/");
    }

    #[test]
    fn resolve_keeps_absolute_inputs() {
        assert_eq!(resolve_lexically("/workspace", "/etc/passwd"), "/etc/passwd");
        assert_eq!(resolve_lexically("/workspace", "a/../b"), "/workspace/b");
    }

    #[test]
    fn workspace_relative_drops_leading_workspace_copies() {
        assert_eq!(workspace_relative("/workspace/p/a/b", "/workspace/p"), vec!["a", "b"]);
        assert_eq!(workspace_relative("workspace/p/a", "/workspace/p"), vec!["a"]);
        assert_eq!(workspace_relative("/workspace/p/workspace/p/a", "/workspace/p"), vec!["a"]);
        assert_eq!(workspace_relative("/workspace/p/../q", "/workspace/p"), vec!["..", "q"]);
        assert_eq!(workspace_relative("/workspace/px/a", "/workspace/p"), vec!["workspace", "px", "a"]);
        assert_eq!(workspace_relative("/etc/passwd", "/workspace/p"), vec!["etc", "passwd"]);
        assert!(workspace_relative("/workspace/p", "/workspace/p").is_empty());
        // Filesystem root as workspace strips nothing.
        assert_eq!(workspace_relative("/a/b", "/"), vec!["a", "b"]);
    }

    #[test]
    fn within_is_segment_wise() {
        assert!(is_within("/workspace/proj1/a", "/workspace/proj1"));
        assert!(is_within("/workspace/proj1", "/workspace/proj1/"));
        assert!(!is_within("/workspace/proj1x/a", "/workspace/proj1"));
        assert!(!is_within("/workspace/proj1-evil/x", "/workspace/proj1"));
        assert!(is_within("/anything", "/"));
    }

    #[test]
    fn within_normalizes_candidate_first() {
        assert!(!is_within("/workspace/proj1/../proj2", "/workspace/proj1"));
        assert!(is_within("/workspace/proj1/./a/../b", "/workspace/proj1"));
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Model
// ─────────────────────────────────────────────────────────────────────────────

mod model {
    use super::*;

    #[test]
    fn project_id_accepts_plain_names() {
        for id in ["proj1", "a.b", "project_42", "uuid-like-0f3a"] {
            assert_eq!(ProjectId::new(id).unwrap().as_str(), id);
        }
    }

    #[test]
    fn project_id_ignores_surrounding_whitespace() {
        assert_eq!(pid(" proj1\n"), pid("proj1"));
        for blank in [" ", "\t", "  \n "] {
            assert!(matches!(
                ProjectId::new(blank),
                Err(WorkspaceError::InvalidProjectId { .. })
            ));
        }
        let cfg = config(ProviderMode::PerProjectRoot);
        assert_eq!(cfg.get_project_workspace_path(&pid("  proj1 ")).as_str(), "/workspace/proj1");
    }

    #[test]
    fn project_id_rejects_separators_and_traversal() {
        for id in ["", ".", "..", "a/b", "a\\b", "../x", "a..b", "x\0y", "tab\tid"] {
            let err = ProjectId::new(id).unwrap_err();
            assert!(
                matches!(err, WorkspaceError::InvalidProjectId { .. }),
                "{id:?} should be rejected, got {err:?}"
            );
        }
    }

    #[test]
    fn base_root_trims_trailing_separator() {
        let root = BaseRoot::new("/workspace/").unwrap();
        assert_eq!(root.path().as_str(), "/workspace");
        assert_eq!(BaseRoot::default().path().as_str(), DEFAULT_WORKSPACE_ROOT);
    }

    #[test]
    fn base_root_must_be_absolute() {
        assert_eq!(
            BaseRoot::new("workspace").unwrap_err(),
            SettingsError::RelativeRoot("workspace".into())
        );
    }

    #[test]
    fn provider_names_map_to_modes() {
        assert_eq!("daytona".parse::<ProviderMode>().unwrap(), ProviderMode::SharedRoot);
        assert_eq!("DAYTONA".parse::<ProviderMode>().unwrap(), ProviderMode::SharedRoot);
        assert_eq!("local_process".parse::<ProviderMode>().unwrap(), ProviderMode::PerProjectRoot);
        assert_eq!("local_docker".parse::<ProviderMode>().unwrap(), ProviderMode::PerProjectRoot);
        assert!(matches!(
            "kubernetes".parse::<ProviderMode>(),
            Err(SettingsError::UnknownProvider(_))
        ));
    }

    #[test]
    fn sandbox_path_parent_and_strip() {
        let p = SandboxPath::parse("/workspace/proj1/notes.md").unwrap();
        assert_eq!(p.file_name(), Some("notes.md"));
        assert_eq!(p.parent().unwrap().as_str(), "/workspace/proj1");
        let base = SandboxPath::parse("/workspace").unwrap();
        assert_eq!(p.strip_prefix(&base).unwrap(), vec!["proj1", "notes.md"]);
        assert!(SandboxPath::parse("/").unwrap().parent().is_none());
        assert!(SandboxPath::parse("relative").is_none());
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Provider strategies
// ─────────────────────────────────────────────────────────────────────────────

mod strategy {
    use super::*;

    #[test]
    fn shared_root_scenario() {
        let cfg = config(ProviderMode::SharedRoot);
        let p = pid("proj1");
        assert_eq!(cfg.get_project_workspace_path(&p).as_str(), "/workspace");
        assert_eq!(cfg.get_project_directory_path(&p).as_str(), "/workspace/proj1");
        assert!(!cfg.is_path_safe("../proj2/x", &p).is_safe());
    }

    #[test]
    fn per_project_root_scenario() {
        let cfg = config(ProviderMode::PerProjectRoot);
        let p = pid("proj1");
        assert_eq!(cfg.get_project_workspace_path(&p).as_str(), "/workspace/proj1");
        assert_eq!(cfg.get_project_directory_path(&p).as_str(), "/workspace/proj1");
        assert_eq!(cfg.normalize_path("notes.md", &p).as_str(), "/workspace/proj1/notes.md");
    }

    #[test]
    fn project_directory_inside_workspace_for_all_modes() {
        for mode in MODES {
            let cfg = config(mode);
            for id in ["a", "proj1", "x.y", "0"] {
                let p = pid(id);
                let layout = cfg.layout(&p);
                assert!(
                    layout.project_directory.starts_with(&layout.workspace_path),
                    "{mode:?}/{id}: {} not under {}",
                    layout.project_directory,
                    layout.workspace_path
                );
            }
        }
    }

    #[test]
    fn strategy_dispatch_matches_mode() {
        let root = BaseRoot::default();
        let p = pid("proj1");
        for mode in MODES {
            let strategy = Strategy::for_mode(mode);
            assert_eq!(strategy.mode(), mode);
            assert_eq!(strategy.layout(&root, &p), config(mode).layout(&p));
        }
        assert_eq!(
            SharedRootStrategy.layout(&root, &p).workspace_path.as_str(),
            "/workspace"
        );
        assert_eq!(
            PerProjectRootStrategy.layout(&root, &p).workspace_path.as_str(),
            "/workspace/proj1"
        );
    }

    #[test]
    fn filesystem_root_as_base() {
        let cfg = WorkspaceConfig::new(BaseRoot::new("/").unwrap(), ProviderMode::PerProjectRoot);
        assert_eq!(cfg.get_project_workspace_path(&pid("p")).as_str(), "/p");
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Normalization and safety
// ─────────────────────────────────────────────────────────────────────────────

mod safety_checks {
    use super::*;

    #[test]
    fn normalize_is_idempotent() {
        // Normalizing a normalized path inside the workspace is a no-op.
        let inputs = ["a/b/../c", "./x//y/", "/workspace/proj1/a/../z", "/notes.md", "proj1/x", "", "/"];
        for mode in MODES {
            let cfg = config(mode);
            let p = pid("proj1");
            for raw in inputs {
                let once = cfg.normalize_path(raw, &p);
                let twice = cfg.normalize_path(once.as_str(), &p);
                assert_eq!(once, twice, "{mode:?}: {raw:?}");
            }
        }
    }

    #[test]
    fn normalize_does_not_fail_on_escape() {
        let cfg = config(ProviderMode::PerProjectRoot);
        let out = cfg.normalize_path("../../etc/passwd", &pid("proj1"));
        assert_eq!(out.as_str(), "/etc/passwd");
    }

    #[test]
    fn escaping_inputs_are_unsafe() {
        let escapes = ["..", "../x", "a/../../x", "./../..", "/../x", "/workspace/proj1/../proj2", "a/b/../../../c"];
        let cfg = config(ProviderMode::PerProjectRoot);
        let p = pid("proj1");
        for raw in escapes {
            let verdict = cfg.is_path_safe(raw, &p);
            assert!(!verdict.is_safe(), "{raw:?} resolved to {}", verdict.path());
            assert_eq!(verdict.reason(), Some(UnsafeReason::EscapesWorkspace));
        }
    }

    #[test]
    fn contained_inputs_are_safe() {
        let cfg = config(ProviderMode::PerProjectRoot);
        let p = pid("proj1");
        for raw in ["notes.md", "a/b/../c", ".", "", "/workspace/proj1/x", "a/..", "/notes.md", "/etc/passwd"] {
            let verdict = cfg.is_path_safe(raw, &p);
            assert!(verdict.is_safe(), "{raw:?} resolved to {}", verdict.path());
        }
    }

    #[test]
    fn sibling_prefix_is_rejected() {
        let cfg = config(ProviderMode::PerProjectRoot);
        let verdict = cfg.is_path_safe("/workspace/proj1/../proj1-evil/x", &pid("proj1"));
        assert!(!verdict.is_safe());
        assert_eq!(verdict.path().as_str(), "/workspace/proj1-evil/x");
        let verdict = cfg.is_path_safe("../proj1x/secret", &pid("proj1"));
        assert!(!verdict.is_safe());
    }

    #[test]
    fn absolute_inputs_resolve_against_workspace() {
        let cfg = config(ProviderMode::PerProjectRoot);
        let p = pid("proj1");
        assert_eq!(cfg.normalize_path("/notes.md", &p).as_str(), "/workspace/proj1/notes.md");
        assert_eq!(cfg.normalize_path("/workspace/proj1/notes.md", &p).as_str(), "/workspace/proj1/notes.md");
        assert_eq!(cfg.normalize_path("/etc/passwd", &p).as_str(), "/workspace/proj1/etc/passwd");
        assert_eq!(
            cfg.normalize_path("/workspace/proj2/x", &p).as_str(),
            "/workspace/proj1/workspace/proj2/x"
        );

        let cfg = config(ProviderMode::SharedRoot);
        assert_eq!(cfg.normalize_path("/proj1/a.md", &p).as_str(), "/workspace/proj1/a.md");
        assert_eq!(cfg.normalize_path("/workspace/proj1/a.md", &p).as_str(), "/workspace/proj1/a.md");
    }

    #[test]
    fn shared_root_sees_other_projects_inside_workspace() {
        // The shared workspace is the root itself; project isolation there is
        // by directory convention, not by the safety check.
        let cfg = config(ProviderMode::SharedRoot);
        assert!(cfg.is_path_safe("proj2/x", &pid("proj1")).is_safe());
        assert!(!cfg.is_path_safe("../x", &pid("proj1")).is_safe());
    }

    #[test]
    fn nul_byte_is_unsafe() {
        let cfg = config(ProviderMode::PerProjectRoot);
        let verdict = cfg.is_path_safe("a\0b", &pid("proj1"));
        assert_eq!(verdict.reason(), Some(UnsafeReason::NulByte));
    }

    #[test]
    fn resolve_absolute_path_fails_closed() {
        let cfg = config(ProviderMode::PerProjectRoot);
        let p = pid("proj1");
        assert_eq!(
            cfg.resolve_absolute_path("docs/a.md", &p).unwrap().as_str(),
            "/workspace/proj1/docs/a.md"
        );
        let err = cfg.resolve_absolute_path("../proj2/a.md", &p).unwrap_err();
        assert_eq!(
            err,
            WorkspaceError::PathEscape {
                path: "/workspace/proj2/a.md".into(),
                boundary: "/workspace/proj1".into(),
            }
        );
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Upload paths
// ─────────────────────────────────────────────────────────────────────────────

mod upload {
    use super::*;

    #[test]
    fn directory_components_are_stripped() {
        for mode in MODES {
            let cfg = config(mode);
            let p = pid("proj1");
            let path = cfg.get_file_upload_path(&p, "a/b/evil.txt").unwrap();
            assert_eq!(path.as_str(), "/workspace/proj1/evil.txt");
            assert!(path.starts_with(&cfg.get_project_directory_path(&p)));
        }
    }

    #[test]
    fn traversal_names_collapse_to_basename() {
        let cfg = config(ProviderMode::SharedRoot);
        let p = pid("proj1");
        let path = cfg.get_file_upload_path(&p, "../../etc/passwd").unwrap();
        assert_eq!(path.as_str(), "/workspace/proj1/passwd");
        let path = cfg.get_file_upload_path(&p, "..\\..\\boot.ini").unwrap();
        assert_eq!(path.as_str(), "/workspace/proj1/boot.ini");
    }

    #[test]
    fn empty_and_dot_names_are_invalid() {
        let cfg = config(ProviderMode::SharedRoot);
        let p = pid("proj1");
        for name in ["", "   ", "a/", ".", "..", "x/..", "dir/.", "bad\0name"] {
            let err = cfg.get_file_upload_path(&p, name).unwrap_err();
            assert!(
                matches!(err, WorkspaceError::InvalidFilename { .. }),
                "{name:?} gave {err:?}"
            );
        }
    }

    #[test]
    fn sanitize_trims_whitespace() {
        assert_eq!(sanitize_filename("  report.pdf ").unwrap(), "report.pdf");
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// ToolPathAccessor
// ─────────────────────────────────────────────────────────────────────────────

mod accessor {
    use super::*;

    fn accessor(mode: ProviderMode) -> ToolPathAccessor {
        ToolPathAccessor::new(Arc::new(config(mode)), pid("proj1"))
    }

    #[test]
    fn caches_layout() {
        let a = accessor(ProviderMode::SharedRoot);
        assert_eq!(a.workspace_path().as_str(), "/workspace");
        assert_eq!(a.project_directory().as_str(), "/workspace/proj1");
        assert_eq!(a.project_id().as_str(), "proj1");
    }

    #[test]
    fn clean_path_is_cosmetic() {
        let a = accessor(ProviderMode::PerProjectRoot);
        assert_eq!(a.clean_path("  //docs///a.md  "), "docs/a.md");
        assert_eq!(a.clean_path("/workspace/proj1/docs/a.md"), "docs/a.md");
        assert_eq!(a.clean_path("/workspace/proj1"), "");
        // Traversal is left for resolve_path to judge.
        assert_eq!(a.clean_path("/../etc"), "../etc");
        // Sibling prefix is not stripped.
        assert_eq!(a.clean_path("/workspace/proj1x/a"), "workspace/proj1x/a");
    }

    #[test]
    fn clean_path_in_shared_root_keeps_project_segment() {
        let a = accessor(ProviderMode::SharedRoot);
        assert_eq!(a.clean_path("/workspace/proj1/a.txt"), "proj1/a.txt");
        assert_eq!(
            a.resolve_path(&a.clean_path("/workspace/proj1/a.txt")).unwrap().as_str(),
            "/workspace/proj1/a.txt"
        );
    }

    #[test]
    fn resolve_path_fails_closed() {
        let a = accessor(ProviderMode::PerProjectRoot);
        assert_eq!(a.resolve_path("notes.md").unwrap().as_str(), "/workspace/proj1/notes.md");
        assert!(matches!(
            a.resolve_path(&a.clean_path("/../../etc/shadow")),
            Err(WorkspaceError::PathEscape { .. })
        ));
    }

    #[test]
    fn is_path_safe_delegates() {
        let a = accessor(ProviderMode::PerProjectRoot);
        assert!(a.is_path_safe("x/y").is_safe());
        assert!(!a.is_path_safe("../proj2").is_safe());
        assert_eq!(a.upload_path("x/y.txt").unwrap().as_str(), "/workspace/proj1/y.txt");
    }

    #[test]
    fn safety_verdict_matches_tool_resolution() {
        let inputs = [
            "/notes.md",
            "notes.md",
            "/workspace/proj1/docs/a.md",
            "/workspace/proj1/../proj2/x",
            "/workspace/proj1/workspace/proj1/a",
            "workspace/proj1/../x",
            "/etc/passwd",
            "../proj2/x",
            "/../x",
            "a/../../b",
            "./a/./b/..",
            "/",
            "",
            "..",
            "a\0b",
        ];
        for mode in MODES {
            let a = accessor(mode);
            for raw in inputs {
                let verdict = a.is_path_safe(raw);
                let resolved = a.resolve_path(&a.clean_path(raw));
                assert_eq!(verdict.is_safe(), resolved.is_ok(), "{mode:?}: {raw:?}");
                if let Ok(path) = resolved {
                    assert_eq!(&path, verdict.path(), "{mode:?}: {raw:?}");
                }
            }
        }
    }

    #[test]
    fn shared_across_threads() {
        let cfg = Arc::new(config(ProviderMode::PerProjectRoot));
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let cfg = cfg.clone();
                std::thread::spawn(move || {
                    let a = ToolPathAccessor::new(cfg, pid(&format!("p{i}")));
                    a.resolve_path("f").unwrap()
                })
            })
            .collect();
        for (i, h) in handles.into_iter().enumerate() {
            assert_eq!(h.join().unwrap().as_str(), format!("/workspace/p{i}/f"));
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Settings
// ─────────────────────────────────────────────────────────────────────────────

mod settings {
    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_unset() {
        let s = Settings::from_lookup(lookup(&[])).unwrap();
        assert_eq!(s.workspace_root.path().as_str(), "/workspace");
        assert_eq!(s.provider, ProviderMode::SharedRoot);
    }

    #[test]
    fn environment_values_are_used() {
        let s = Settings::from_lookup(lookup(&[
            ("SANDBOX_WORKSPACE_ROOT", "/srv/sandbox/"),
            ("SANDBOX_PROVIDER", "Local_Process"),
        ]))
        .unwrap();
        assert_eq!(s.workspace_root.path().as_str(), "/srv/sandbox");
        assert_eq!(s.provider, ProviderMode::PerProjectRoot);

        let cfg = WorkspaceConfig::from_settings(&s);
        assert_eq!(cfg.get_project_workspace_path(&pid("p")).as_str(), "/srv/sandbox/p");
    }

    #[test]
    fn invalid_values_are_reported() {
        assert!(matches!(
            Settings::from_lookup(lookup(&[("SANDBOX_PROVIDER", "nope")])),
            Err(SettingsError::UnknownProvider(_))
        ));
        assert!(matches!(
            Settings::from_lookup(lookup(&[("SANDBOX_WORKSPACE_ROOT", "rel/root")])),
            Err(SettingsError::RelativeRoot(_))
        ));
    }
}
