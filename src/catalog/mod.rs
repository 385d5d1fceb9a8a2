//! The curated list of tracked projects.
//!
//! The built-in list is compiled into the binary. A JSON file with the same
//! shape can replace it at startup (see [`Catalog::from_json_file`]).

use std::path::Path;

use anyhow::{Context, Result, bail};
use serde::Deserialize;

use crate::runtime::Runtime;
use crate::source::RepoId;

/// One tracked project.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CatalogEntry {
    /// Identity of the project; the store's unique key.
    pub canonical_url: String,
    /// Web URL of the project's repository on the hosting service.
    pub source_url: String,
    /// Free-text description of what the project depends on.
    pub dependency_tags: String,
}

impl CatalogEntry {
    pub fn new(canonical_url: &str, source_url: &str, dependency_tags: &str) -> Self {
        Self {
            canonical_url: canonical_url.to_string(),
            source_url: source_url.to_string(),
            dependency_tags: dependency_tags.to_string(),
        }
    }
}

/// Ordered list of catalog entries. Order is declaration order and is the
/// order in which entries are fetched and stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog {
    entries: Vec<CatalogEntry>,
}

const BUILTIN: &[(&str, &str, &str)] = &[
    ("https://wails.io", "https://github.com/wailsapp/wails", "Go, Web Technologies"),
    ("https://fyne.io", "https://github.com/fyne-io/fyne", "Go"),
    ("https://github.com/zserge/lorca", "https://github.com/zserge/lorca", "Go, Chrome"),
    (
        "https://github.com/asticode/go-astilectron",
        "https://github.com/asticode/go-astilectron",
        "Go, Electron",
    ),
    ("https://gioui.org", "https://github.com/gioui/gio", "Go"),
    ("https://github.com/webview/webview", "https://github.com/webview/webview", "Go, C/C++"),
    ("https://www.electronjs.org", "https://github.com/electron/electron", "JavaScript, Node.js"),
    ("https://nwjs.io", "https://github.com/nwjs/nw.js", "JavaScript, Node.js"),
    ("https://cordova.apache.org", "https://github.com/apache/cordova", "JavaScript"),
    (
        "https://necolas.github.io/react-native-web/",
        "https://github.com/necolas/react-native-web",
        "React Native, JavaScript",
    ),
    (
        "https://ionicframework.com",
        "https://github.com/ionic-team/ionic-framework",
        "Angular, React, Vue, JavaScript",
    ),
    ("https://capacitorjs.com", "https://github.com/ionic-team/capacitor", "JavaScript"),
    ("https://sciter.com", "https://github.com/c-smile/sciter-sdk", "HTML, CSS, JavaScript"),
    ("https://neutralino.js.org", "https://github.com/neutralinojs/neutralinojs", "JavaScript"),
    ("https://www.qt.io", "https://github.com/qt/qt5", "C++"),
    (
        "https://dotnet.microsoft.com/apps/xamarin",
        "https://github.com/xamarin/xamarin-forms-samples",
        "C#, .NET",
    ),
    ("https://unity.com", "https://github.com/Unity-Technologies/UnityCsReference", "C#"),
    ("https://kivy.org", "https://github.com/kivy/kivy", "Python"),
    ("https://www.codenameone.com", "https://github.com/codenameone/CodenameOne", "Java"),
    ("https://flex.apache.org", "https://github.com/apache/flex-sdk", "ActionScript"),
    // Same canonical URL as above; the upsert keeps these tags.
    ("https://cordova.apache.org", "https://github.com/apache/cordova", "HTML, CSS, JavaScript"),
    ("https://flutter.dev", "https://github.com/flutter/flutter", "Dart"),
    ("https://reactnative.dev", "https://github.com/facebook/react-native", "JavaScript, React"),
    ("https://tauri.studio", "https://github.com/tauri-apps/tauri", "Rust, Web Technologies"),
    ("https://www.webui.me/", "https://github.com/webui-dev/webui", "Go, Web Technologies"),
    ("https://deskgap.com/", "https://github.com/patr0nus/DeskGap", "JavaScript"),
    ("https://proton-native.js.org", "https://github.com/kusti8/proton-native", "JavaScript, React"),
];

impl Catalog {
    pub fn new(entries: Vec<CatalogEntry>) -> Self {
        Self { entries }
    }

    /// The compiled-in list of tracked projects.
    pub fn builtin() -> Self {
        Self::new(
            BUILTIN
                .iter()
                .map(|(canonical, source, tags)| CatalogEntry::new(canonical, source, tags))
                .collect(),
        )
    }

    /// Load a catalog from a JSON array of entries and validate it.
    pub fn from_json_file<R: Runtime>(runtime: &R, path: &Path) -> Result<Self> {
        let content = runtime
            .read_to_string(path)
            .with_context(|| format!("Failed to read catalog file {}", path.display()))?;
        Self::from_json(&content)
            .with_context(|| format!("Invalid catalog file {}", path.display()))
    }

    pub fn from_json(content: &str) -> Result<Self> {
        let entries: Vec<CatalogEntry> =
            serde_json::from_str(content).context("Failed to parse catalog JSON")?;
        let catalog = Self::new(entries);
        catalog.validate()?;
        Ok(catalog)
    }

    /// The catalog must have at least one entry, every field must be non-empty and every source URL must point at a
    /// hosted repository.
    pub fn validate(&self) -> Result<()> {
        if self.is_empty() {
            bail!("Catalog has no entries");
        }
        for (index, entry) in self.entries.iter().enumerate() {
            if entry.canonical_url.trim().is_empty() {
                bail!("Catalog entry {} has an empty canonical_url", index);
            }
            if entry.dependency_tags.trim().is_empty() {
                bail!(
                    "Catalog entry {} ({}) has empty dependency_tags",
                    index,
                    entry.canonical_url
                );
            }
            RepoId::from_source_url(&entry.source_url).with_context(|| {
                format!(
                    "Catalog entry {} ({}) has an unusable source_url",
                    index, entry.canonical_url
                )
            })?;
        }
        Ok(())
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
