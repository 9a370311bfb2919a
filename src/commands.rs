use crate::blur::{mask, BlurPolicy, Interaction, Visibility};
use crate::config::Settings;
use crate::grouping::{group_by_day, relative_age};
use crate::model::Note;
use crate::state::AppState;
use crate::storage::{FileKv, StoreError, ThoughtStore};
use crate::timer::{format_clock, TimerState, Ticker};
use crate::ui;
use anyhow::{bail, Context, Result};
use chrono::{Duration as ChronoDuration, Local, Utc};
use std::io::{self, BufRead, Write};
use std::thread;
use std::time::{Duration, Instant};

pub fn add(settings: &Settings, content: String) -> Result<()> {
    let content = content.trim();
    if content.is_empty() {
        bail!("thought is empty");
    }
    let mut store = thought_store(settings);
    let note = store.add(content).context("saving thought")?;
    println!("Added thought {}", note.id);
    Ok(())
}

pub fn list(settings: &Settings, reveal: bool) -> Result<()> {
    let store = thought_store(settings);
    let state = AppState::load(kv(settings));
    let notes = store.list();
    if notes.is_empty() {
        println!("(no thoughts yet)");
        return Ok(());
    }
    let policy = BlurPolicy::new(
        state.prefs().blur_enabled && !reveal,
        ChronoDuration::seconds(settings.blur_delay_secs),
    );
    let now = Utc::now();
    for group in group_by_day(&notes, &Local::now()) {
        println!("{}", group.label);
        for note in group.notes {
            print_note(note, &policy, now);
        }
        println!();
    }
    Ok(())
}

pub fn edit(settings: &Settings, id: String, content: String) -> Result<()> {
    let content = content.trim();
    if content.is_empty() {
        bail!("thought is empty");
    }
    let mut store = thought_store(settings);
    match store.update(&id, content) {
        Ok(_) => {
            println!("Updated thought {}", id);
            Ok(())
        }
        Err(StoreError::NoteNotFound(_)) => bail!("thought {} not found", id),
        Err(other) => Err(other).context("saving thought"),
    }
}

pub fn delete(settings: &Settings, id: String) -> Result<()> {
    let mut store = thought_store(settings);
    if !store.delete(&id).context("saving thoughts")? {
        bail!("thought {} not found", id);
    }
    println!("Deleted thought {}", id);
    Ok(())
}

pub fn clear(settings: &Settings, yes: bool) -> Result<()> {
    if !yes && !confirm("Delete all thoughts? [y/N] ")? {
        println!("Canceled");
        return Ok(());
    }
    let mut store = thought_store(settings);
    store.delete_all().context("clearing thoughts")?;
    println!("Cleared all thoughts");
    Ok(())
}

/// Foreground countdown. Ctrl-C abandons it; nothing is saved either way.
pub fn timer(hours: u64, minutes: u64) -> Result<()> {
    let mut timer = TimerState::default();
    timer.start(hours, minutes);
    if !timer.active {
        bail!("timer duration must be greater than zero");
    }
    let mut ticker = Ticker::default();
    let mut last = Instant::now();
    let mut out = io::stdout();
    while timer.is_visible() {
        write!(out, "\rTimer {:>9}", format_clock(timer.remaining_seconds))?;
        out.flush()?;
        thread::sleep(Duration::from_millis(250));
        let now = Instant::now();
        for _ in 0..ticker.advance(now - last) {
            timer.tick();
        }
        last = now;
    }
    writeln!(out, "\rTimer finished ({})", format_clock(timer.duration_seconds))?;
    Ok(())
}

pub fn prefs(
    settings: &Settings,
    blur: Option<bool>,
    focus: Option<bool>,
    reset_onboarding: bool,
) -> Result<()> {
    let mut state = AppState::load(kv(settings));
    if let Some(enabled) = blur {
        state.set_blur_enabled(enabled).context("saving preferences")?;
    }
    if let Some(enabled) = focus {
        state
            .set_focus_mode_enabled(enabled)
            .context("saving preferences")?;
    }
    if reset_onboarding {
        state
            .set_onboarding_completed(false)
            .context("saving preferences")?;
    }
    let prefs = state.prefs();
    println!("blur: {}", on_off(prefs.blur_enabled));
    println!("focus mode: {}", on_off(prefs.focus_mode_enabled));
    println!(
        "onboarding: {}",
        if prefs.onboarding_completed {
            "completed"
        } else {
            "pending"
        }
    );
    println!("data dir: {}", settings.data_dir.display());
    Ok(())
}

pub fn tui(settings: &Settings) -> Result<()> {
    ui::run(thought_store(settings), AppState::load(kv(settings)), settings)
}

fn kv(settings: &Settings) -> FileKv {
    FileKv::new(&settings.data_dir)
}

fn thought_store(settings: &Settings) -> ThoughtStore<FileKv> {
    ThoughtStore::new(kv(settings))
}

fn confirm(prompt: &str) -> Result<bool> {
    print!("{}", prompt);
    io::stdout().flush()?;
    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim(), "y" | "Y" | "yes"))
}

fn on_off(flag: bool) -> &'static str {
    if flag {
        "on"
    } else {
        "off"
    }
}

fn print_note(note: &Note, policy: &BlurPolicy, now: chrono::DateTime<Utc>) {
    let text = match policy.visibility(note, now, Interaction::default()) {
        Visibility::Clear => note.content.clone(),
        Visibility::Blurred => mask(&note.content),
    };
    println!("  - {}: {}", note.id, text);
    println!("    {}", relative_age(note.created_at, now));
}
