use std::sync::Arc;

use futures::future::BoxFuture;
use reqwest::{Client, Method, StatusCode};
use serde::{Serialize, de::DeserializeOwned};
use uuid::Uuid;

use crate::{
    dao::{game_store::GameStore, storage::StorageResult},
    scoring::game::{GameState, GameStatePatch},
};

use super::{
    config::HttpStoreConfig,
    error::{HttpStoreError, HttpStoreResult},
};

const HEALTH_PATH: &str = "health";

/// [`GameStore`] backed by the league application's REST API.
///
/// Rows live at `{base_url}/games/{id}`: `GET` loads one, `PATCH` upserts a
/// partial state and answers with the stored row.
#[derive(Clone)]
pub struct HttpGameStore {
    client: Client,
    base_url: Arc<str>,
    token: Option<Arc<str>>,
}

impl HttpGameStore {
    /// Build the client and make sure the API answers.
    pub async fn connect(config: HttpStoreConfig) -> HttpStoreResult<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|source| HttpStoreError::ClientBuilder { source })?;

        let store = Self {
            client,
            base_url: Arc::<str>::from(config.base_url.trim_end_matches('/')),
            token: config.token.map(Arc::<str>::from),
        };

        store.ping().await?;
        Ok(store)
    }

    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}/{}", self.base_url, path);
        let builder = self.client.request(method, url);
        if let Some(ref token) = self.token {
            builder.bearer_auth(token.as_ref())
        } else {
            builder
        }
    }

    async fn ping(&self) -> HttpStoreResult<()> {
        let response = self
            .request(Method::GET, HEALTH_PATH)
            .send()
            .await
            .map_err(|source| HttpStoreError::RequestSend {
                path: HEALTH_PATH.to_string(),
                source,
            })?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(HttpStoreError::RequestStatus {
                path: HEALTH_PATH.to_string(),
                status: response.status(),
            })
        }
    }

    async fn get_document<T>(&self, path: &str) -> HttpStoreResult<Option<T>>
    where
        T: DeserializeOwned,
    {
        let response = self
            .request(Method::GET, path)
            .send()
            .await
            .map_err(|source| HttpStoreError::RequestSend {
                path: path.to_string(),
                source,
            })?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => {
                response.json::<T>().await.map(Some).map_err(|source| {
                    HttpStoreError::DecodeResponse {
                        path: path.to_string(),
                        source,
                    }
                })
            }
            other => Err(HttpStoreError::RequestStatus {
                path: path.to_string(),
                status: other,
            }),
        }
    }

    async fn patch_document<B, T>(&self, game_id: Uuid, path: &str, body: &B) -> HttpStoreResult<T>
    where
        B: ?Sized + Serialize,
        T: DeserializeOwned,
    {
        let response = self
            .request(Method::PATCH, path)
            .json(body)
            .send()
            .await
            .map_err(|source| HttpStoreError::RequestSend {
                path: path.to_string(),
                source,
            })?;

        match response.status() {
            status if status.is_success() => {
                response
                    .json::<T>()
                    .await
                    .map_err(|source| HttpStoreError::DecodeResponse {
                        path: path.to_string(),
                        source,
                    })
            }
            status @ (StatusCode::BAD_REQUEST
            | StatusCode::CONFLICT
            | StatusCode::UNPROCESSABLE_ENTITY) => {
                Err(HttpStoreError::UpdateRefused { game_id, status })
            }
            other => Err(HttpStoreError::RequestStatus {
                path: path.to_string(),
                status: other,
            }),
        }
    }
}

fn game_path(id: Uuid) -> String {
    format!("games/{id}")
}

impl GameStore for HttpGameStore {
    fn load_game(&self, game_id: Uuid) -> BoxFuture<'static, StorageResult<Option<GameState>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .get_document::<GameState>(&game_path(game_id))
                .await
                .map_err(Into::into)
        })
    }

    fn persist_game_update(
        &self,
        game_id: Uuid,
        patch: GameStatePatch,
    ) -> BoxFuture<'static, StorageResult<GameState>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .patch_document::<_, GameState>(game_id, &game_path(game_id), &patch)
                .await
                .map_err(Into::into)
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.ping().await.map_err(Into::into) })
    }
}
