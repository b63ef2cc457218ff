use anyhow::Result;
use clap::Parser;
use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use rep_tracker::config::{Config, LogConfig};
use rep_tracker::driver::{DriverHandle, DriverOptions, FrameDriver, Snapshot};
use rep_tracker::exercise::ExerciseKind;
use rep_tracker::recorder::LogRecorder;
use rep_tracker::render::{segments, DRAW_THRESHOLD, SKELETON_CONNECTIONS};
use rep_tracker::source::ReplaySource;

const CONFIG_PATH: &str = "config.toml";

#[derive(Parser, Debug)]
#[command(name = "rep-tracker", version = env!("GIT_VERSION"))]
#[command(about = "姿勢記録からエクササイズの回数を数える")]
struct Args {
    /// 設定ファイル
    #[arg(long, default_value = CONFIG_PATH)]
    config: PathBuf,
    /// 種目 (pushup, squat, jumpingJack, plank, armRaise)
    #[arg(short, long)]
    exercise: Option<ExerciseKind>,
    /// 姿勢記録 (JSON lines)。省略時は設定ファイルの値
    #[arg(short, long)]
    poses: Option<PathBuf>,
    /// 標準入力のコマンドで操作する
    #[arg(short, long)]
    interactive: bool,
}

// ---------------------------------------------------------------------------
// Logging
// ---------------------------------------------------------------------------

fn open_log_file(dir: &Path) -> Result<(File, PathBuf)> {
    std::fs::create_dir_all(dir)?;
    let ts = chrono::Local::now().format("%Y%m%d_%H%M%S");
    let path = dir.join(format!("rep_tracker_{}.log", ts));
    let file = File::create(&path)?;
    Ok((file, path))
}

fn init_logging(config: &LogConfig) -> Result<Option<PathBuf>> {
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(&config.filter))?;

    let (file_layer, path) = if config.file {
        let (file, path) = open_log_file(&config.dir)?;
        let layer = fmt::layer().with_ansi(false).with_writer(Arc::new(file));
        (Some(layer), Some(path))
    } else {
        (None, None)
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(io::stderr))
        .with(file_layer)
        .init();
    Ok(path)
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

fn status_line(s: &Snapshot) -> String {
    let secs = s.elapsed.as_secs();
    let bones = s
        .pose
        .as_ref()
        .map(|p| segments(p, DRAW_THRESHOLD).len())
        .unwrap_or(0);
    let unit = if s.exercise.is_hold() { "s" } else { "" };
    format!(
        "[{}] {} {:02}:{:02} count={}{} phase={:?} bones={}/{} | {}",
        s.exercise,
        s.status,
        secs / 60,
        secs % 60,
        s.state.count,
        unit,
        s.state.phase,
        bones,
        SKELETON_CONNECTIONS.len(),
        s.state.feedback,
    )
}

/// 回数かフィードバックが変わるたびに1行出す
async fn print_progress(handle: DriverHandle) {
    let mut rx = handle.subscribe();
    let mut last: Option<(u32, String)> = None;
    loop {
        let line = {
            let s = rx.borrow_and_update();
            let key = (s.state.count, s.state.feedback.clone());
            if last.as_ref() != Some(&key) {
                last = Some(key);
                Some(status_line(&s))
            } else {
                None
            }
        };
        if let Some(line) = line {
            println!("{}", line);
        }
        if rx.changed().await.is_err() {
            break;
        }
    }
}

fn print_summary(snapshot: &Snapshot) -> Result<()> {
    if let Some(summary) = &snapshot.summary {
        println!("{}", serde_json::to_string_pretty(summary)?);
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Modes
// ---------------------------------------------------------------------------

/// 記録を最後まで流して完了させる
async fn run_to_end(handle: &DriverHandle) -> Result<()> {
    let progress = tokio::spawn(print_progress(handle.clone()));
    handle.start().await?;
    tokio::select! {
        exhausted = handle.wait_for(|s| s.source_exhausted) => {
            exhausted?;
        }
        _ = tokio::signal::ctrl_c() => info!("interrupted"),
    }
    handle.complete().await?;
    let done = handle.wait_for(|s| s.summary.is_some()).await?;
    progress.abort();
    print_summary(&done)?;
    Ok(())
}

fn print_help() {
    println!("コマンド:");
    println!("  s           - 開始");
    println!("  p           - 一時停止 / 再開");
    println!("  r           - カウントをリセット");
    println!("  e <種目>    - 種目を切り替え (例: e squat)");
    println!("  i           - 現在の状態を表示");
    println!("  c           - ワークアウトを完了");
    println!("  n           - 新しいワークアウト");
    println!("  q           - 終了");
    println!();
}

async fn run_interactive(handle: &DriverHandle) -> Result<()> {
    print_help();
    let progress = tokio::spawn(print_progress(handle.clone()));
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        print!("> ");
        io::stdout().flush()?;

        let Some(input) = lines.next_line().await? else {
            break;
        };
        let parts: Vec<&str> = input.split_whitespace().collect();
        if parts.is_empty() {
            continue;
        }

        match parts[0] {
            "s" => handle.start().await?,
            "p" => handle.toggle_pause().await?,
            "r" => handle.reset().await?,
            "e" if parts.len() == 2 => match parts[1].parse::<ExerciseKind>() {
                Ok(kind) => handle.select_exercise(kind).await?,
                Err(e) => println!("{}", e),
            },
            "i" => println!("{}", status_line(&handle.snapshot())),
            "c" => {
                handle.complete().await?;
                let done = tokio::time::timeout(
                    Duration::from_secs(1),
                    handle.wait_for(|s| s.summary.is_some()),
                )
                .await;
                match done {
                    Ok(done) => print_summary(&done?)?,
                    Err(_) => println!("完了できません (未開始)"),
                }
            }
            "n" => handle.new_workout().await?,
            "q" => {
                println!("終了します");
                break;
            }
            _ => {
                println!("不明なコマンド: {}", parts[0]);
            }
        }
    }

    progress.abort();
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // 読み込み失敗はログ初期化後に報告
    let (config, load_error) = match Config::load(&args.config) {
        Ok(config) => (config, None),
        Err(e) => (Config::default(), Some(e)),
    };
    let log_path = init_logging(&config.log)?;
    if let Some(e) = load_error {
        warn!("{:#}, using defaults", e);
    }
    if let Some(path) = log_path {
        info!(path = %path.display(), "logging to file");
    }

    let exercise = args.exercise.unwrap_or(config.app.exercise);
    let poses = args.poses.unwrap_or_else(|| config.replay.path.clone());
    let source = ReplaySource::open(&poses, config.replay.repeat)?;
    if source.is_empty() {
        warn!(path = %poses.display(), "pose recording has no frames");
    }

    let (driver, handle) = FrameDriver::new(
        source,
        LogRecorder::new(),
        exercise,
        DriverOptions::from_config(&config.app),
    );
    let task = tokio::spawn(driver.run());

    if args.interactive {
        run_interactive(&handle).await?;
    } else {
        run_to_end(&handle).await?;
    }

    handle.stop().await?;
    let last = task.await?;
    info!(frames = last.frames, status = %last.status, "done");
    Ok(())
}
