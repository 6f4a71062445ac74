use crate::domain::{AuthEvent, AuthUser, Credentials, Session, SignUp};
use async_trait::async_trait;
use tokio::sync::broadcast;

pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// 認証プロバイダポート
///
/// ホスト型の認証サービスを抽象化する。
/// サインイン・サインアウト・トークン更新に成功した実装は
/// `subscribe()` の購読者に `AuthEvent` を配信すること。
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// メールアドレスとパスワードでサインインする
    async fn sign_in(&self, credentials: &Credentials) -> Result<Session>;

    /// アカウントを作成する
    async fn sign_up(&self, credentials: &Credentials) -> Result<SignUp>;

    /// セッションを無効化する
    async fn sign_out(&self, session: &Session) -> Result<()>;

    /// リフレッシュトークンでセッションを更新する
    async fn refresh(&self, refresh_token: &str) -> Result<Session>;

    /// アクセストークンに対応するユーザーを取得する
    ///
    /// トークンが無効・期限切れの場合は `Ok(None)` を返す。
    async fn get_user(&self, access_token: &str) -> Result<Option<AuthUser>>;

    /// 認証状態の変化を購読する
    fn subscribe(&self) -> broadcast::Receiver<AuthEvent>;
}
