use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "tunggakan-split")]
#[command(about = "DATATUNGGAKAN シートをチーム別シートに振り分けるツール", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// 詳細ログを出力
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// ルールファイル（設定値より優先）
    #[arg(long, global = true)]
    pub rules: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 入力ブックをチーム別に振り分ける
    Process {
        /// 入力Excelファイル（.xlsx）
        #[arg(required = true)]
        input: PathBuf,

        /// 出力ディレクトリ（設定値より優先）
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// 結果をJSONで出力
        #[arg(long)]
        json: bool,
    },

    /// 振り分けルールの表示/更新
    Rules {
        #[command(subcommand)]
        action: RulesAction,
    },

    /// 生成済みファイルのパスを表示
    Locate {
        /// 出力ファイル名（hasil_*.xlsx）
        #[arg(required = true)]
        file_name: String,

        /// 出力ディレクトリ（設定値より優先）
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
    },

    /// 設定を表示/編集
    Config {
        /// 設定を表示
        #[arg(long)]
        show: bool,

        /// ルールファイルのパスを設定
        #[arg(long)]
        set_rules_path: Option<PathBuf>,

        /// 出力ディレクトリを設定
        #[arg(long)]
        set_output_dir: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
pub enum RulesAction {
    /// 現在のルールを表示
    Show,

    /// JSONファイルの内容でルールを置き換える
    Set {
        /// 新しいルール（JSON）
        #[arg(required = true)]
        file: PathBuf,

        /// 確認せずに保存
        #[arg(short, long)]
        yes: bool,
    },

    /// ルールファイルのパスを表示
    Path,
}
