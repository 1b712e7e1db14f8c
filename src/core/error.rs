//! Error handling for the release pipeline
//!
//! Every stage reports failures through [`PublishError`], which carries a
//! stable error code, recovery guidance for the operator, and the stage that
//! failed.

use super::state_machine::PipelineState;
use thiserror::Error;

/// Main error type for release pipeline operations
#[derive(Error, Debug)]
pub enum PublishError {
    // Configuration errors
    #[error("設定エラー: {0}")]
    ConfigError(String),

    #[error("[{version}] 無効なバージョン番号です: {message}")]
    InvalidVersion { version: String, message: String },

    #[error("必須のメタデータが不足しています: {field}")]
    MissingMetadata { field: String },

    // Resolution errors
    #[error("[{coordinates}] 依存関係を解決できませんでした: {message}")]
    DependencyResolution {
        coordinates: String,
        message: String,
    },

    // Build errors
    #[error("コンパイルに失敗しました: {message}")]
    CompilationFailed { message: String },

    #[error("フォーマット違反が {} 件検出されました", .files.len())]
    FormattingViolation { files: Vec<String> },

    #[error("[{artifact}] アーティファクトの作成に失敗しました: {message}")]
    PackagingFailed { artifact: String, message: String },

    #[error("[{artifact}] マニフェストのバージョンが一致しません (期待値: {expected}, 実際: {found})")]
    VersionMismatch {
        artifact: String,
        expected: String,
        found: String,
    },

    // Security errors
    #[error("ハードコードされた機密情報が {count} 件検出されました")]
    SecretsDetected { count: usize },

    #[error("署名鍵が設定されていません ({variable})")]
    SigningKeyMissing { variable: String },

    #[error("署名鍵のパスフレーズが正しくありません")]
    InvalidPassphrase,

    #[error("署名に失敗しました: {message}")]
    SigningFailed { message: String },

    #[error("アップロード認証情報が設定されていません ({variable})")]
    CredentialsMissing { variable: String },

    #[error("[{repository}] 認証に失敗しました")]
    AuthenticationFailed { repository: String },

    // Publishing errors
    #[error("[{url}] アップロードに失敗しました: {message}")]
    UploadFailed { url: String, message: String },

    #[error("[{url}] ネットワークエラーが発生しました: {message}")]
    NetworkError { url: String, message: String },

    // State errors
    #[error("状態ファイルが破損しています: {0}")]
    StateCorrupted(String),

    // Command execution errors
    #[error("[{command}] コマンド実行エラー: {message}")]
    CommandError { command: String, message: String },

    #[error("入出力エラー: {0}")]
    Io(#[from] std::io::Error),
}

impl PublishError {
    /// Pipeline stage in which this error is raised
    pub fn stage(&self) -> PipelineState {
        match self {
            Self::ConfigError(_)
            | Self::InvalidVersion { .. }
            | Self::MissingMetadata { .. }
            | Self::SecretsDetected { .. }
            | Self::StateCorrupted(_)
            | Self::Io(_) => PipelineState::Initial,
            Self::DependencyResolution { .. } => PipelineState::Resolving,
            Self::CompilationFailed { .. } | Self::CommandError { .. } => PipelineState::Compiling,
            Self::FormattingViolation { .. } => PipelineState::Formatting,
            Self::PackagingFailed { .. } | Self::VersionMismatch { .. } => {
                PipelineState::Packaging
            }
            Self::SigningKeyMissing { .. } | Self::InvalidPassphrase | Self::SigningFailed { .. } => {
                PipelineState::Signing
            }
            Self::CredentialsMissing { .. }
            | Self::AuthenticationFailed { .. }
            | Self::UploadFailed { .. }
            | Self::NetworkError { .. } => PipelineState::Publishing,
        }
    }

    /// Whether the archives built so far survive this failure.
    ///
    /// Signing and publishing failures abort only the publish step; the
    /// archives in `build/libs` stay in place, unsigned and unpublished.
    pub fn leaves_artifacts(&self) -> bool {
        matches!(
            self.stage(),
            PipelineState::Signing | PipelineState::Publishing
        )
    }

    /// Get suggested actions for this error
    pub fn suggested_actions(&self) -> Vec<&'static str> {
        match self {
            Self::ConfigError(_) => vec![
                ".publish-config.yaml の構文を確認してください",
                "maven-publisher check で設定を検証してください",
            ],
            Self::InvalidVersion { .. } => {
                vec!["英数字と . - _ + のみを使用してください（例: 1.3.0, 1.3.0-SNAPSHOT）"]
            }
            Self::MissingMetadata { .. } => {
                vec![".publish-config.yaml の pom セクションを確認してください"]
            }
            Self::DependencyResolution { .. } => vec![
                "座標 (group:artifact:version) の綴りを確認してください",
                "repositories に正しいリポジトリURLが設定されているか確認してください",
                "ネットワーク接続を確認してください",
            ],
            Self::CompilationFailed { .. } => vec![
                "コンパイラの出力を確認してください",
                "JDK がインストールされ PATH に含まれているか確認してください",
            ],
            Self::FormattingViolation { .. } => vec![
                "formatting.mode を apply にして自動修正してください",
                "google-java-format --replace を手動で実行してください",
            ],
            Self::PackagingFailed { .. } => vec![
                "build ディレクトリの書き込み権限を確認してください",
                "ディスクの空き容量を確認してください",
            ],
            Self::VersionMismatch { .. } => {
                vec!["build/libs を削除してから再実行してください"]
            }
            Self::SecretsDetected { .. } => vec![
                "検出されたファイルを確認してください",
                "認証情報は環境変数で渡してください",
            ],
            Self::SigningKeyMissing { .. } => vec![
                "環境変数を設定してください（例: SIGNING_KEY, SIGNING_PASSWORD）",
                "maven-publisher keygen で署名鍵を作成できます",
            ],
            Self::InvalidPassphrase => vec!["SIGNING_PASSWORD の値を確認してください"],
            Self::SigningFailed { .. } => vec!["署名鍵の内容を確認してください"],
            Self::CredentialsMissing { .. } => vec![
                "環境変数を設定してください（例: MAVEN_UPLOAD_USERNAME, MAVEN_UPLOAD_PASSWORD）",
            ],
            Self::AuthenticationFailed { .. } => vec![
                "認証情報を確認してください",
                "トークンの有効期限を確認してください",
            ],
            Self::UploadFailed { .. } => vec![
                "リポジトリのステータスを確認してください",
                "ステージングリポジトリを確認し、不完全なアップロードを破棄してください",
            ],
            Self::NetworkError { .. } => vec!["インターネット接続を確認してください"],
            Self::StateCorrupted(_) => {
                vec![".publish-state.jsonを削除して再試行してください"]
            }
            Self::CommandError { .. } => vec![
                "コマンドの出力を確認してください",
                "必要なツールがインストールされているか確認してください",
            ],
            Self::Io(_) => vec!["ファイルのパスと権限を確認してください"],
        }
    }

    /// Get error code for this error
    pub fn code(&self) -> &'static str {
        match self {
            Self::ConfigError(_) => "CONFIG_ERROR",
            Self::InvalidVersion { .. } => "INVALID_VERSION",
            Self::MissingMetadata { .. } => "MISSING_METADATA",
            Self::DependencyResolution { .. } => "DEPENDENCY_RESOLUTION",
            Self::CompilationFailed { .. } => "COMPILATION_FAILED",
            Self::FormattingViolation { .. } => "FORMATTING_VIOLATION",
            Self::PackagingFailed { .. } => "PACKAGING_FAILED",
            Self::VersionMismatch { .. } => "VERSION_MISMATCH",
            Self::SecretsDetected { .. } => "SECRETS_DETECTED",
            Self::SigningKeyMissing { .. } => "SIGNING_KEY_MISSING",
            Self::InvalidPassphrase => "INVALID_PASSPHRASE",
            Self::SigningFailed { .. } => "SIGNING_FAILED",
            Self::CredentialsMissing { .. } => "CREDENTIALS_MISSING",
            Self::AuthenticationFailed { .. } => "AUTHENTICATION_FAILED",
            Self::UploadFailed { .. } => "UPLOAD_FAILED",
            Self::NetworkError { .. } => "NETWORK_ERROR",
            Self::StateCorrupted(_) => "STATE_CORRUPTED",
            Self::CommandError { .. } => "COMMAND_ERROR",
            Self::Io(_) => "IO_ERROR",
        }
    }
}
