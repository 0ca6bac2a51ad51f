//! PyInstaller spec rendering.

use crate::bundler::{Arch, Error, Result, Settings};
use handlebars::Handlebars;
use serde_json::json;
use std::path::Path;

const SPEC_TEMPLATE: &str = r#"# -*- mode: python ; coding: utf-8 -*-
# Generated for {{arch}} by psydekick_release. Edits are overwritten on every build.

a = Analysis(
    [{{{entry_point}}}],
    pathex=[{{{workspace}}}],
    binaries=[],
    datas=[
{{#each datas}}        ({{{this.source}}}, {{{this.destination}}}),
{{/each}}    ],
    hiddenimports=[
{{#each hidden_imports}}        {{{this}}},
{{/each}}    ],
    hookspath=[],
    hooksconfig={},
    runtime_hooks=[],
    excludes=[],
    noarchive=False,
)
pyz = PYZ(a.pure)

exe = EXE(
    pyz,
    a.scripts,
    [],
    exclude_binaries=True,
    name={{{app_name}}},
    debug=False,
    bootloader_ignore_signals=False,
    strip=False,
    upx=False,
    console=False,
    argv_emulation=False,
    target_arch={{{target_arch}}},
    codesign_identity=None,
    entitlements_file=None,
)
coll = COLLECT(
    exe,
    a.binaries,
    a.datas,
    strip=False,
    upx=False,
    name={{{app_name}}},
)
app = BUNDLE(
    coll,
    name={{{bundle_name}}},
    icon={{{icon}}},
    bundle_identifier={{{bundle_identifier}}},
    version={{{version}}},
    info_plist={
        'CFBundleShortVersionString': {{{version}}},
        'CFBundleVersion': {{{version}}},
        'LSMinimumSystemVersion': {{{minimum_system_version}}},
        'NSHighResolutionCapable': True,
    },
)
"#;

/// Quote a string as a Python literal.
///
/// Backslashes, quotes and control characters are escaped so paths and
/// names can't break out of the literal.
pub fn py_str(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('\'');
    for c in s.chars() {
        match c {
            '\\' => out.push_str(r"\\"),
            '\'' => out.push_str(r"\'"),
            '\n' => out.push_str(r"\n"),
            '\r' => out.push_str(r"\r"),
            '\t' => out.push_str(r"\t"),
            c => out.push(c),
        }
    }
    out.push('\'');
    out
}

fn py_path(path: &Path) -> String {
    py_str(&path.to_string_lossy())
}

/// Render the freezer specification for one architecture.
pub fn render_spec(settings: &Settings, arch: Arch) -> Result<String> {
    let spec = settings.spec();

    let datas: Vec<_> = spec
        .resources
        .iter()
        .map(|r| {
            json!({
                "source": py_path(&settings.resolve(&r.source)),
                "destination": py_str(&r.destination),
            })
        })
        .collect();

    let hidden_imports: Vec<String> = spec.hidden_imports.iter().map(|m| py_str(m)).collect();

    let icon = spec
        .icon
        .as_ref()
        .map(|p| py_path(&settings.resolve(p)))
        .unwrap_or_else(|| "None".to_string());

    let data = json!({
        "arch": arch.as_str(),
        "entry_point": py_path(&settings.resolve(&spec.entry_point)),
        "workspace": py_path(settings.workspace()),
        "datas": datas,
        "hidden_imports": hidden_imports,
        "app_name": py_str(&spec.app_name),
        "bundle_name": py_str(&spec.frozen_bundle_name()),
        "target_arch": py_str(arch.as_str()),
        "icon": icon,
        "bundle_identifier": py_str(&spec.bundle_identifier),
        "version": py_str(&settings.version_string()),
        "minimum_system_version": py_str(&spec.minimum_system_version),
    });

    let mut registry = Handlebars::new();
    registry.set_strict_mode(true);
    registry.register_escape_fn(handlebars::no_escape);
    registry
        .register_template_string("pyinstaller-spec", SPEC_TEMPLATE)
        .map_err(|e| Error::GenericError(format!("invalid spec template: {e}")))?;

    registry
        .render("pyinstaller-spec", &data)
        .map_err(|e| Error::GenericError(format!("failed to render freezer spec: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundler::{ResourceMapping, SettingsBuilder, test_spec};

    fn settings() -> Settings {
        let mut spec = test_spec("PsydeKick");
        spec.resources = vec![
            ResourceMapping {
                source: "main.py".into(),
                destination: ".".into(),
            },
            ResourceMapping {
                source: "config".into(),
                destination: "config".into(),
            },
        ];
        spec.hidden_imports = vec!["streamlit.web.cli".into(), "pytz".into()];
        spec.icon = Some("assets/img/icon.icns".into());
        SettingsBuilder::new()
            .workspace("/work")
            .spec(spec)
            .build()
            .unwrap()
    }

    #[test]
    fn renders_arch_specific_spec() {
        let rendered = render_spec(&settings(), Arch::X86_64).unwrap();

        assert!(rendered.contains("target_arch='x86_64'"));
        assert!(rendered.contains("['/work/run_app.py']"));
        assert!(rendered.contains("('/work/config', 'config'),"));
        assert!(rendered.contains("'streamlit.web.cli',"));
        assert!(rendered.contains("name='PsydeKick.app'"));
        assert!(rendered.contains("icon='/work/assets/img/icon.icns'"));
        assert!(rendered.contains("'CFBundleShortVersionString': '1.2.3'"));
        assert!(rendered.contains("'LSMinimumSystemVersion': '10.15'"));
        assert!(rendered.contains("bundle_identifier='com.example.app'"));
    }

    #[test]
    fn missing_icon_renders_none() {
        let mut s = settings();
        let spec = test_spec("PsydeKick");
        s = SettingsBuilder::new()
            .workspace(s.workspace())
            .spec(spec)
            .build()
            .unwrap();
        let rendered = render_spec(&s, Arch::Arm64).unwrap();
        assert!(rendered.contains("icon=None"));
        assert!(rendered.contains("target_arch='arm64'"));
    }

    #[test]
    fn python_literals_are_escaped() {
        assert_eq!(py_str("it's"), r"'it\'s'");
        assert_eq!(py_str(r"C:\dir"), r"'C:\\dir'");
        assert_eq!(py_str("a\nb"), r"'a\nb'");
    }
}
