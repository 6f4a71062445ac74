use crate::domain::{AuthUser, Credentials, Session, SignUp, UserId};

use super::ServiceDependencies;
use super::errors::{LibraryApplicationError, Result};

/// 現在の利用者を確定する（セッションゲート）
///
/// 更新系の操作はすべて、書き込みの前にこの関数を通すこと。
/// 失敗した場合は何も書き込まずに操作を中止する。
///
/// # エラー
/// - AuthenticationRequired: セッションがない、トークンが無効、または検証できない
#[tracing::instrument(skip_all)]
pub async fn resolve_identity(
    deps: &ServiceDependencies,
    session: Option<&Session>,
) -> Result<UserId> {
    let access_token = session.map(|s| s.access_token.as_str());
    let user = authenticate_token(deps, access_token).await?;
    Ok(user.id)
}

/// アクセストークンを検証し、対応するユーザーを返す
///
/// HTTPのBearerトークンのように、セッション全体を持たない呼び出し元向け。
#[tracing::instrument(skip_all)]
pub async fn authenticate_token(
    deps: &ServiceDependencies,
    access_token: Option<&str>,
) -> Result<AuthUser> {
    let access_token = access_token
        .filter(|t| !t.is_empty())
        .ok_or(LibraryApplicationError::AuthenticationRequired)?;

    match deps.auth.get_user(access_token).await {
        Ok(Some(user)) => Ok(user),
        Ok(None) => {
            tracing::debug!("Access token rejected by auth provider");
            Err(LibraryApplicationError::AuthenticationRequired)
        }
        Err(e) => {
            tracing::warn!(error = %e, "Could not validate session");
            Err(LibraryApplicationError::AuthenticationRequired)
        }
    }
}

/// サインインする
///
/// 認証情報は正規化してから送る。失敗の詳細はログにのみ残す。
#[tracing::instrument(skip(deps, password))]
pub async fn sign_in(deps: &ServiceDependencies, email: &str, password: &str) -> Result<Session> {
    let credentials = Credentials::new(email, password);

    deps.auth.sign_in(&credentials).await.map_err(|e| {
        tracing::error!(error = %e, "sign_in error");
        LibraryApplicationError::SignInFailed(e)
    })
}

/// アカウントを作成する
#[tracing::instrument(skip(deps, password))]
pub async fn sign_up(deps: &ServiceDependencies, email: &str, password: &str) -> Result<SignUp> {
    let credentials = Credentials::new(email, password);

    deps.auth.sign_up(&credentials).await.map_err(|e| {
        tracing::error!(error = %e, "sign_up error");
        LibraryApplicationError::SignUpFailed(e)
    })
}

/// サインアウトする
#[tracing::instrument(skip_all)]
pub async fn sign_out(deps: &ServiceDependencies, session: &Session) -> Result<()> {
    deps.auth.sign_out(session).await.map_err(|e| {
        tracing::error!(error = %e, "sign_out error");
        LibraryApplicationError::SignOutFailed(e)
    })
}
