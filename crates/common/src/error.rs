/// Campo obrigatório ausente ou vazio na entrada de uma operação.
///
/// As mensagens vão direto para o corpo das respostas HTTP, por isso ficam no
/// mesmo formato que os clientes já esperam.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("placeId is required")]
    MissingPlaceId,
    #[error("uniqueId and pendingScriptToAdd are required")]
    MissingScriptFields,
}

/// Falhas do gate de autenticação por cookie.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("cookie de autenticação ausente")]
    MissingToken,
    #[error("token de autenticação não confere")]
    TokenMismatch,
}

/// Erros de decodificação do corpo JSON.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("JSON inválido: {0}")]
    InvalidJson(String),
    #[error("corpo da requisição deve ser um objeto JSON")]
    NotAnObject,
}

/// Erros dos stores em memória.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StorageError {
    #[error("lock do store '{0}' envenenado")]
    Poisoned(&'static str),
    #[error("store encerrado")]
    Closed,
}

/// Erros de configuração detectados no startup.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} deve ser maior que zero")]
    ZeroDuration(&'static str),
}

/// Erro top-level do PlaceHub.
#[derive(Debug, thiserror::Error)]
pub enum HubError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Result type alias.
pub type HubResult<T> = Result<T, HubError>;
