use anyhow::Context;
use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tunggakan_split::{cli, config, output, processor, rules_store};
use tunggakan_split::{ProcessingResult, RulesMap};
use cli::{Cli, Commands, RulesAction};
use config::Config;
use processor::Processor;
use rules_store::RulesStore;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logger(cli.verbose);

    let config = Config::load()?;
    let rules_path = cli.rules.clone().unwrap_or_else(|| config.rules_path.clone());
    let store = Arc::new(RulesStore::new(rules_path));

    match cli.command {
        Commands::Process { input, output_dir, json } => {
            let output_dir = output_dir.unwrap_or_else(|| config.output_dir.clone());

            if !json {
                println!("📊 tunggakan-split - チーム別振り分け\n");
                println!("[1/2] 入力ファイルを準備中...");
            }

            // 入力は処理後に削除されるため、コピーを渡す
            let staged = stage_upload(&input)
                .with_context(|| format!("入力ファイルを準備できません: {}", input.display()))?;

            if !json {
                println!("✔ {}\n", input.display());
                println!("[2/2] 振り分け中... (ルール: {})", store.path().display());
            }

            let processor = Processor::new(Arc::clone(&store), &output_dir);
            let result = processor.process_file(&staged)?;

            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                print_summary(&result);
                println!("\n✅ 振り分け完了");
            }
        }

        Commands::Rules { action } => match action {
            RulesAction::Show => {
                let rules = store.get()?;
                println!("{}", rules.to_json_pretty()?);
            }

            RulesAction::Set { file, yes } => {
                let content = std::fs::read_to_string(&file)
                    .with_context(|| format!("ルールファイルを読み込めません: {}", file.display()))?;
                let rules = RulesMap::from_json(&content)
                    .with_context(|| format!("ルールが不正です: {}", file.display()))?;

                println!("チーム数: {}  ルート数: {}", rules.len(), rules.route_count());
                for entry in rules.iter() {
                    println!("  {}: {}件", entry.team, entry.routes.len());
                }

                if !yes && !confirm_overwrite(store.path())? {
                    println!("中止しました");
                    return Ok(());
                }

                store.save(rules)?;
                println!("✔ ルールを保存しました: {}", store.path().display());
            }

            RulesAction::Path => {
                println!("{}", store.path().display());
            }
        },

        Commands::Locate { file_name, output_dir } => {
            let output_dir = output_dir.unwrap_or_else(|| config.output_dir.clone());
            let path = output::resolve_output_path(&output_dir, &file_name)?;
            println!("{}", path.display());
        }

        Commands::Config { show, set_rules_path, set_output_dir } => {
            let mut config = config;

            if let Some(path) = set_rules_path {
                config.set_rules_path(path)?;
                println!("✔ ルールファイルのパスを設定しました");
            }

            if let Some(dir) = set_output_dir {
                config.set_output_dir(dir)?;
                println!("✔ 出力ディレクトリを設定しました");
            }

            if show {
                println!("設定:");
                println!("  ルールファイル: {}", config.rules_path.display());
                println!("  出力ディレクトリ: {}", config.output_dir.display());
                println!("  設定ファイル: {}", Config::config_path()?.display());
            }
        }
    }

    Ok(())
}

fn init_logger(verbose: bool) {
    let level = if verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Warn
    };

    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

/// 入力ファイルを一時アップロードとしてコピーする
fn stage_upload(input: &Path) -> anyhow::Result<PathBuf> {
    let mut source = std::fs::File::open(input)?;
    let mut staged = tempfile::Builder::new()
        .prefix("upload-")
        .suffix(".xlsx")
        .tempfile()?;
    std::io::copy(&mut source, &mut staged)?;

    let (_, path) = staged.keep()?;
    Ok(path)
}

fn confirm_overwrite(path: &Path) -> anyhow::Result<bool> {
    let confirmed = dialoguer::Confirm::new()
        .with_prompt(format!("{} を上書きしますか?", path.display()))
        .default(false)
        .interact()?;
    Ok(confirmed)
}

fn print_summary(result: &ProcessingResult) {
    println!("✔ 出力: {}", result.output_path.display());
    println!("  チーム数: {}", result.summary.total_teams);
    for (team, count) in result.summary.team_counts.iter() {
        println!("    {}: {}行", team, count);
    }
    println!("  UNMAPPED: {}行", result.unmapped_rows_count);
}
