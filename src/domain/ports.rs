use crate::soap::{MessageExchange, Param, XmlNode};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::time::Duration;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

/// Connection settings of one service session.
pub trait ConfigProvider: Send + Sync {
    fn server_url(&self) -> &str;
    fn username(&self) -> &str;
    fn password_hash(&self) -> &str;
    fn accept_invalid_certs(&self) -> bool;
    fn timeout(&self) -> Option<Duration>;
}

/// Remote call gateway: sends one operation and hands back its `{Operation}Response` element.
#[async_trait]
pub trait RemoteGateway: Send + Sync {
    async fn call(&self, operation: &str, params: Vec<Param>) -> Result<XmlNode>;

    fn server_url(&self) -> &str;

    fn username(&self) -> &str;

    fn last_exchange(&self) -> Option<MessageExchange>;
}
