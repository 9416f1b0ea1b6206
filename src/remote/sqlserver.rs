//! SQL Server driver backed by `tiberius` over a tokio TCP stream.

use async_trait::async_trait;
use tiberius::{AuthMethod, Client, Config, EncryptionLevel, Query, Row};
use tokio::net::TcpStream;
use tokio_util::compat::{Compat, TokioAsyncWriteCompatExt};

use super::{
    ConnectionString, RemoteDriver, RemoteError, RemoteHandle, RemoteRow, ServerInfo, SqlParam,
    dsn,
};

type SqlClient = Client<Compat<TcpStream>>;

const SERVER_INFO_SQL: &str = "SELECT \
     CAST(@@VERSION AS NVARCHAR(4000)) AS version, \
     CAST(SERVERPROPERTY('ProductName') AS NVARCHAR(256)) AS product_name, \
     CAST(SERVERPROPERTY('Edition') AS NVARCHAR(256)) AS edition";

/// Production [`RemoteDriver`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SqlServerDriver;

impl RemoteDriver for SqlServerDriver {
    fn open(&self, dsn: &ConnectionString) -> Result<Box<dyn RemoteHandle>, RemoteError> {
        let config = match dsn {
            ConnectionString::Ado(raw) => Config::from_ado_string(raw)
                .map_err(|e| RemoteError::InvalidConnectionString(e.to_string()))?,
            ConnectionString::Url(raw) => config_from_url(raw)?,
        };

        Ok(Box::new(SqlServerHandle {
            config,
            client: None,
        }))
    }
}

fn config_from_url(raw: &str) -> Result<Config, RemoteError> {
    let target = dsn::parse_url(raw)?;
    let port = u16::try_from(target.port).map_err(|_| {
        RemoteError::InvalidConnectionString(format!("port {} out of range", target.port))
    })?;

    let mut config = Config::new();
    config.host(&target.host);
    config.port(port);
    if !target.database.is_empty() {
        config.database(&target.database);
    }
    config.authentication(AuthMethod::sql_server(&target.username, &target.password));
    config.encryption(EncryptionLevel::Off);
    config.trust_cert();
    Ok(config)
}

struct SqlServerHandle {
    config: Config,
    client: Option<SqlClient>,
}

impl SqlServerHandle {
    async fn client(&mut self) -> Result<&mut SqlClient, RemoteError> {
        if self.client.is_none() {
            let client = connect(self.config.clone()).await?;
            self.client = Some(client);
        }

        self.client
            .as_mut()
            .ok_or_else(|| RemoteError::Connect("connection is closed".to_string()))
    }
}

#[async_trait]
impl RemoteHandle for SqlServerHandle {
    async fn ping(&mut self) -> Result<(), RemoteError> {
        let client = self.client().await?;
        client
            .simple_query("SELECT 1")
            .await
            .map_err(query_error)?
            .into_row()
            .await
            .map_err(query_error)?;
        Ok(())
    }

    async fn server_info(&mut self) -> Result<ServerInfo, RemoteError> {
        let client = self.client().await?;
        let row = client
            .simple_query(SERVER_INFO_SQL)
            .await
            .map_err(query_error)?
            .into_row()
            .await
            .map_err(query_error)?
            .ok_or_else(|| RemoteError::Query("server info query returned no rows".to_string()))?;

        let text = |idx: usize| -> Result<String, RemoteError> {
            Ok(row
                .try_get::<&str, _>(idx)
                .map_err(query_error)?
                .unwrap_or_default()
                .to_string())
        };

        Ok(ServerInfo {
            version: text(0)?,
            product_name: text(1)?,
            edition: text(2)?,
        })
    }

    async fn query(
        &mut self,
        sql: &str,
        params: &[SqlParam],
    ) -> Result<Vec<RemoteRow>, RemoteError> {
        let mut query = Query::new(sql.to_string());
        for param in params {
            match param {
                SqlParam::Text(value) => query.bind(value.clone()),
                SqlParam::Int(value) => query.bind(*value),
                SqlParam::Date(value) => query.bind(*value),
            }
        }

        let client = self.client().await?;
        let rows = query
            .query(client)
            .await
            .map_err(query_error)?
            .into_first_result()
            .await
            .map_err(query_error)?;

        rows.iter().map(text_row).collect()
    }

    async fn close(self: Box<Self>) {
        let SqlServerHandle { client, .. } = *self;
        if let Some(client) = client
            && let Err(e) = client.close().await
        {
            tracing::debug!(error = %e, "Closing remote connection failed");
        }
    }
}

async fn connect(config: Config) -> Result<SqlClient, RemoteError> {
    let tcp = open_tcp(&config).await?;

    match Client::connect(config.clone(), tcp.compat_write()).await {
        Ok(client) => Ok(client),
        // Azure-style gateways redirect the login to another node.
        Err(tiberius::error::Error::Routing { host, port }) => {
            let mut config = config;
            config.host(&host);
            config.port(port);
            let tcp = open_tcp(&config).await?;
            Client::connect(config, tcp.compat_write())
                .await
                .map_err(|e| RemoteError::Connect(e.to_string()))
        }
        Err(e) => Err(RemoteError::Connect(e.to_string())),
    }
}

async fn open_tcp(config: &Config) -> Result<TcpStream, RemoteError> {
    let tcp = TcpStream::connect(config.get_addr())
        .await
        .map_err(|e| RemoteError::Connect(e.to_string()))?;
    tcp.set_nodelay(true)
        .map_err(|e| RemoteError::Connect(e.to_string()))?;
    Ok(tcp)
}

fn text_row(row: &Row) -> Result<RemoteRow, RemoteError> {
    let names: Vec<String> = row
        .columns()
        .iter()
        .map(|column| column.name().to_string())
        .collect();

    let mut columns = Vec::with_capacity(names.len());
    for (idx, name) in names.into_iter().enumerate() {
        let value = row
            .try_get::<&str, _>(idx)
            .map_err(query_error)?
            .map(str::to_owned);
        columns.push((name, value));
    }
    Ok(RemoteRow::new(columns))
}

fn query_error(e: tiberius::error::Error) -> RemoteError {
    RemoteError::Query(e.to_string())
}
