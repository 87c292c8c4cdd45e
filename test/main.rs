// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

use dotstrap::{
    materialize::MaterializeError, template::TemplateError, Defaults, ErrorPolicy, Materializer,
    Outcome, OverwritePolicy, ScriptedPrompter, SourceTree, TargetState,
};

use anyhow::Result;
use pretty_assertions::assert_eq;
use sealed_test::prelude::*;
use std::{
    fs::{create_dir_all, read_dir, read_link, read_to_string, symlink_metadata, write},
    path::{Path, PathBuf},
    process::{Command, Output, Stdio},
};

/// Scratch bootstrap root with a source tree and an empty home directory.
struct Fixture {
    source: PathBuf,
    home: PathBuf,
}

impl Fixture {
    fn new() -> Result<Self> {
        let root = std::env::current_dir()?;
        let fixture = Self {
            source: root.join("dotfiles"),
            home: root.join("home"),
        };
        create_dir_all(&fixture.source)?;
        create_dir_all(&fixture.home)?;

        Ok(fixture)
    }

    fn source_file(&self, relative: impl AsRef<Path>, contents: impl AsRef<[u8]>) -> Result<()> {
        let path = self.source.join(relative);
        if let Some(parent) = path.parent() {
            create_dir_all(parent)?;
        }
        write(path, contents)?;

        Ok(())
    }

    fn home_file(&self, relative: impl AsRef<Path>, contents: impl AsRef<[u8]>) -> Result<()> {
        let path = self.home.join(relative);
        if let Some(parent) = path.parent() {
            create_dir_all(parent)?;
        }
        write(path, contents)?;

        Ok(())
    }

    fn materializer(&self, defaults: Defaults) -> Materializer {
        Materializer::new(&self.home, defaults)
    }

    /// Run the dotstrap binary against this fixture.
    fn dotstrap(&self, args: &[&str]) -> Result<Output> {
        let defaults = self.source.with_file_name("defaults.toml");
        let output = Command::new(env!("CARGO_BIN_EXE_dotstrap"))
            .args(args)
            .arg("--source")
            .arg(&self.source)
            .arg("--home")
            .arg(&self.home)
            .arg("--defaults")
            .arg(defaults)
            .stdin(Stdio::null())
            .output()?;

        Ok(output)
    }

    fn home_is_empty(&self) -> Result<bool> {
        Ok(read_dir(&self.home)?.next().is_none())
    }
}

fn alice() -> Defaults {
    let mut defaults = Defaults::new();
    defaults.insert("name", "alice");
    defaults
}

#[sealed_test]
fn full_run_materializes_every_entry() -> Result<()> {
    let fixture = Fixture::new()?;
    fixture.source_file("zshrc", "export EDITOR=vim\n")?;
    fixture.source_file("vim/colors/x.vim", "hi Normal\n")?;
    fixture.source_file("gitconfig.tera", "[user]\n\tname = {{name}}\n")?;
    fixture.source_file("README.md", "not a dotfile\n")?;
    fixture.source_file("oh-my-zsh/oh-my-zsh.sh", "# not a dotfile\n")?;

    let entries = SourceTree::open(&fixture.source)?.entries()?;
    let report = fixture.materializer(alice()).run(
        &entries,
        OverwritePolicy::Unset,
        &mut ScriptedPrompter::default(),
    )?;
    assert!(report.is_success());
    assert_eq!(report.records.len(), 3);

    assert_eq!(
        read_link(fixture.home.join(".zshrc"))?,
        fixture.source.join("zshrc")
    );
    assert_eq!(
        read_link(fixture.home.join(".vim/colors/x.vim"))?,
        fixture.source.join("vim/colors/x.vim")
    );
    assert_eq!(
        read_to_string(fixture.home.join(".gitconfig"))?,
        "[user]\n\tname = alice\n"
    );

    // Housekeeping never shows up.
    assert!(symlink_metadata(fixture.home.join(".README.md")).is_err());
    assert!(symlink_metadata(fixture.home.join(".oh-my-zsh")).is_err());

    Ok(())
}

#[sealed_test]
fn second_run_is_idempotent() -> Result<()> {
    let fixture = Fixture::new()?;
    fixture.source_file("zshrc", "export EDITOR=vim\n")?;
    fixture.source_file("config/git/config.tera", "name = {{ name }}\n")?;

    let entries = SourceTree::open(&fixture.source)?.entries()?;
    let materializer = fixture.materializer(alice());
    materializer.run(
        &entries,
        OverwritePolicy::Unset,
        &mut ScriptedPrompter::default(),
    )?;

    let mut prompter = ScriptedPrompter::default();
    let report = materializer.run(&entries, OverwritePolicy::Unset, &mut prompter)?;

    assert!(prompter.asked().is_empty());
    assert!(report
        .records
        .iter()
        .all(|record| matches!(record.outcome, Outcome::Identical)));
    assert_eq!(
        materializer
            .status(&entries)?
            .into_iter()
            .map(|(_, state)| state)
            .collect::<Vec<_>>(),
        vec![TargetState::Identical, TargetState::Identical]
    );

    Ok(())
}

#[sealed_test]
fn always_answer_covers_later_conflicts() -> Result<()> {
    let fixture = Fixture::new()?;
    fixture.source_file("bashrc", "new")?;
    fixture.source_file("gitconfig.tera", "{{ name }}")?;
    fixture.source_file("vimrc", "new")?;
    fixture.home_file(".bashrc", "old")?;
    fixture.home_file(".gitconfig", "old")?;
    fixture.home_file(".vimrc", "old")?;

    let entries = SourceTree::open(&fixture.source)?.entries()?;
    let mut prompter = ScriptedPrompter::selecting(["always"]);
    let report = fixture
        .materializer(alice())
        .run(&entries, OverwritePolicy::Unset, &mut prompter)?;

    assert_eq!(prompter.asked().len(), 1);
    assert_eq!(report.policy, OverwritePolicy::Always);
    assert_eq!(
        read_link(fixture.home.join(".bashrc"))?,
        fixture.source.join("bashrc")
    );
    assert_eq!(read_to_string(fixture.home.join(".gitconfig"))?, "alice");
    assert_eq!(read_to_string(fixture.home.join(".vimrc"))?, "new");

    Ok(())
}

#[sealed_test]
fn missing_key_aborts_remaining_entries() -> Result<()> {
    let fixture = Fixture::new()?;
    fixture.source_file("a.tera", "{{ missing }}")?;
    fixture.source_file("zshrc", "export EDITOR=vim\n")?;

    let entries = SourceTree::open(&fixture.source)?.entries()?;
    let result = fixture.materializer(Defaults::new()).run(
        &entries,
        OverwritePolicy::Unset,
        &mut ScriptedPrompter::default(),
    );

    match result {
        Err(MaterializeError::Template {
            source: TemplateError::KeyMissing { key },
            ..
        }) => assert_eq!(key, "missing"),
        other => panic!("expected missing key failure, got {other:?}"),
    }
    assert!(symlink_metadata(fixture.home.join(".zshrc")).is_err());

    Ok(())
}

#[sealed_test]
fn missing_key_is_reported_when_collecting() -> Result<()> {
    let fixture = Fixture::new()?;
    fixture.source_file("a.tera", "{{ missing }}")?;
    fixture.source_file("zshrc", "export EDITOR=vim\n")?;

    let entries = SourceTree::open(&fixture.source)?.entries()?;
    let report = fixture
        .materializer(Defaults::new())
        .with_error_policy(ErrorPolicy::CollectAndReport)
        .run(
            &entries,
            OverwritePolicy::Unset,
            &mut ScriptedPrompter::default(),
        )?;

    assert!(!report.is_success());
    let failed = report
        .failures()
        .map(|record| record.entry.to_string())
        .collect::<Vec<_>>();
    assert_eq!(failed, vec!["a.tera".to_string()]);
    assert!(symlink_metadata(fixture.home.join(".a")).is_err());
    assert_eq!(
        read_link(fixture.home.join(".zshrc"))?,
        fixture.source.join("zshrc")
    );

    Ok(())
}

#[sealed_test]
fn status_does_not_touch_home() -> Result<()> {
    let fixture = Fixture::new()?;
    fixture.source_file("bashrc", "new")?;
    fixture.source_file("vimrc", "set nu\n")?;
    fixture.source_file("zshrc", "export EDITOR=vim\n")?;
    fixture.home_file(".bashrc", "old")?;
    fixture.home_file(".vimrc", "set nu\n")?;

    let entries = SourceTree::open(&fixture.source)?.entries()?;
    let result = fixture.materializer(Defaults::new()).status(&entries)?;
    let expect = vec![
        (fixture.home.join(".bashrc"), TargetState::Differs),
        (fixture.home.join(".vimrc"), TargetState::Identical),
        (fixture.home.join(".zshrc"), TargetState::Missing),
    ];
    assert_eq!(result, expect);
    assert_eq!(read_to_string(fixture.home.join(".bashrc"))?, "old");
    assert!(symlink_metadata(fixture.home.join(".zshrc")).is_err());

    Ok(())
}

#[sealed_test]
fn yes_then_render_failure_keeps_existing_target() -> Result<()> {
    let fixture = Fixture::new()?;
    fixture.source_file("gitconfig.tera", "{{ missing }}")?;
    fixture.home_file(".gitconfig", "old")?;

    let entries = SourceTree::open(&fixture.source)?.entries()?;
    let result = fixture.materializer(Defaults::new()).run(
        &entries,
        OverwritePolicy::Unset,
        &mut ScriptedPrompter::selecting(["yes"]),
    );

    assert!(result.is_err());
    assert_eq!(read_to_string(fixture.home.join(".gitconfig"))?, "old");

    Ok(())
}

#[sealed_test]
fn binary_exits_zero_on_full_success() -> Result<()> {
    let fixture = Fixture::new()?;
    fixture.source_file("zshrc", "export EDITOR=vim\n")?;
    fixture.source_file("gitconfig.tera", "name = {{ name }}\n")?;
    write("defaults.toml", "name = \"alice\"\n")?;

    let output = fixture.dotstrap(&["install"])?;

    assert_eq!(output.status.code(), Some(0));
    assert_eq!(
        read_link(fixture.home.join(".zshrc"))?,
        fixture.source.join("zshrc")
    );
    assert_eq!(
        read_to_string(fixture.home.join(".gitconfig"))?,
        "name = alice\n"
    );

    Ok(())
}

#[sealed_test]
fn binary_exits_one_when_keep_going_records_failure() -> Result<()> {
    let fixture = Fixture::new()?;
    fixture.source_file("a.tera", "{{ missing }}")?;
    fixture.source_file("zshrc", "export EDITOR=vim\n")?;

    let output = fixture.dotstrap(&["install", "--keep-going"])?;

    assert_eq!(output.status.code(), Some(1));
    assert!(symlink_metadata(fixture.home.join(".a")).is_err());
    assert_eq!(
        read_link(fixture.home.join(".zshrc"))?,
        fixture.source.join("zshrc")
    );

    Ok(())
}

#[sealed_test]
fn binary_list_leaves_home_untouched() -> Result<()> {
    let fixture = Fixture::new()?;
    fixture.source_file("zshrc", "export EDITOR=vim\n")?;
    fixture.source_file("vim/colors/x.vim", "hi Normal\n")?;

    let output = fixture.dotstrap(&["list"])?;

    assert_eq!(output.status.code(), Some(0));
    let stdout = String::from_utf8(output.stdout)?;
    assert!(stdout.contains(".vim/colors/x.vim"));
    assert!(stdout.contains(".zshrc"));
    assert!(fixture.home_is_empty()?);

    Ok(())
}

#[sealed_test]
fn binary_status_leaves_home_untouched() -> Result<()> {
    let fixture = Fixture::new()?;
    fixture.source_file("zshrc", "export EDITOR=vim\n")?;
    fixture.source_file("vim/colors/x.vim", "hi Normal\n")?;

    let output = fixture.dotstrap(&["status"])?;

    assert_eq!(output.status.code(), Some(0));
    let stdout = String::from_utf8(output.stdout)?;
    let missing = stdout
        .lines()
        .filter(|line| line.starts_with("missing"))
        .count();
    assert_eq!(missing, 2);
    assert!(fixture.home_is_empty()?);

    Ok(())
}
