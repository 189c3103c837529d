//! Content-script resolution for navigations
//!
//! Recomputed on every navigation; results are never cached because match
//! outcomes depend on the navigated URL.

use crate::matcher;
use crate::models::ExtensionInfo;
use crate::utils::resolve_resource;
use serde::{Deserialize, Serialize};
use std::fs;
use tracing::warn;

/// Injection timing, passed through from the manifest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunAt {
    DocumentStart,
    DocumentEnd,
    DocumentIdle,
}

impl RunAt {
    fn parse(declared: Option<&str>) -> Self {
        match declared {
            Some("document_start") => RunAt::DocumentStart,
            Some("document_end") => RunAt::DocumentEnd,
            _ => RunAt::DocumentIdle,
        }
    }
}

/// Script and stylesheet payloads one extension contributes to a page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentScriptBundle {
    pub extension_id: String,
    pub js: Vec<String>,
    pub css: Vec<String>,
    pub run_at: RunAt,
}

/// Resolve the ordered bundles applying to `url`.
///
/// A block qualifies when the URL matches at least one inclusion pattern
/// and none of the exclusions. Files that fail to read are skipped
/// individually; a block with nothing left contributes no bundle. Output
/// preserves manifest declaration order across extensions and blocks,
/// because injection order matters to scripts with load-order dependencies.
pub fn resolve_for_url(extensions: &[ExtensionInfo], url: &str) -> Vec<ContentScriptBundle> {
    let mut bundles = Vec::new();

    for extension in extensions {
        for block in &extension.manifest.content_scripts {
            if !matcher::matches(url, &block.matches) {
                continue;
            }
            if matcher::matches(url, &block.exclude_matches) {
                continue;
            }

            let js = read_all(extension, &block.js);
            let css = read_all(extension, &block.css);
            if js.is_empty() && css.is_empty() {
                continue;
            }

            bundles.push(ContentScriptBundle {
                extension_id: extension.id.clone(),
                js,
                css,
                run_at: RunAt::parse(block.run_at.as_deref()),
            });
        }
    }

    bundles
}

fn read_all(extension: &ExtensionInfo, declared: &[String]) -> Vec<String> {
    let mut bodies = Vec::new();
    for file in declared {
        let path = resolve_resource(&extension.path, file);
        match fs::read_to_string(&path) {
            Ok(body) => bodies.push(body),
            Err(e) => {
                // Partial bundles are valid; one unreadable file must not
                // drop its siblings
                warn!(
                    extension = extension.id.as_str(),
                    file = file.as_str(),
                    error = %e,
                    "skipping unreadable content-script file"
                );
            }
        }
    }
    bodies
}
