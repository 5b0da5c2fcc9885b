//! Administrator API client (admin dashboard → rifas server).
//!
//! Every request carries `Authorization: Bearer {token}`.

use reqwest::{Client, RequestBuilder};
use serde::Serialize;
use url::Url;

use super::ClientError;
use crate::objects::{
    AssignTicketsRequest, AssignTicketsResponse, CreateRaffleRequest, CreateRaffleResponse,
    DeleteRaffleResponse, DrawRequest, DrawResponse, EditRaffleRequest, LiveDrawRequest,
    LiveDrawResponse, LiveEventsCleanupResponse, RaffleResponse, RevertResponse, TicketResponse,
    WinnerResponse,
};
use crate::token::BEARER_PREFIX;

/// Typed HTTP client for the rifas **administrator API**.
#[derive(Debug, Clone)]
pub struct AdminClient {
    http: Client,
    base_url: Url,
    token: String,
}

impl AdminClient {
    /// Create a new `AdminClient`.
    ///
    /// * `base_url` – root URL of the rifas server.
    /// * `token` – a bearer token issued by the login service.
    pub fn new(base_url: Url, token: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            base_url,
            token: token.into(),
        }
    }

    /// Replace the default `reqwest::Client` with a custom one.
    pub fn with_http_client(mut self, client: Client) -> Self {
        self.http = client;
        self
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request.header(
            reqwest::header::AUTHORIZATION,
            format!("{BEARER_PREFIX}{}", self.token),
        )
    }

    async fn send_json<B: Serialize, T: serde::de::DeserializeOwned>(
        &self,
        method: reqwest::Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<T, ClientError> {
        let url = self.base_url.join(path)?;
        let mut request = self.authorized(self.http.request(method, url));
        if let Some(body) = body {
            request = request.json(body);
        }
        parse_response(request.send().await?).await
    }

    /// `POST /administrador/crearRifas` – create a raffle and its tickets.
    pub async fn create_raffle(
        &self,
        body: &CreateRaffleRequest,
    ) -> Result<CreateRaffleResponse, ClientError> {
        self.send_json(reqwest::Method::POST, "/administrador/crearRifas", Some(body))
            .await
    }

    /// `GET /administrador/listarRifas` – list all raffles, newest first.
    pub async fn list_raffles(&self) -> Result<Vec<RaffleResponse>, ClientError> {
        self.send_json::<(), _>(reqwest::Method::GET, "/administrador/listarRifas", None)
            .await
    }

    /// `PUT /administrador/editarRifa/{id}` – edit a raffle, resizing its ticket pool if needed.
    pub async fn edit_raffle(
        &self,
        raffle_id: i64,
        body: &EditRaffleRequest,
    ) -> Result<RaffleResponse, ClientError> {
        self.send_json(
            reqwest::Method::PUT,
            &format!("/administrador/editarRifa/{raffle_id}"),
            Some(body),
        )
        .await
    }

    /// `DELETE /administrador/eliminarRifa/{id}` – delete a raffle and everything it owns.
    pub async fn delete_raffle(&self, raffle_id: i64) -> Result<DeleteRaffleResponse, ClientError> {
        self.send_json::<(), _>(
            reqwest::Method::DELETE,
            &format!("/administrador/eliminarRifa/{raffle_id}"),
            None,
        )
        .await
    }

    /// `GET /administrador/rifas/boletos/{id}` – list the tickets of a raffle.
    pub async fn list_tickets(&self, raffle_id: i64) -> Result<Vec<TicketResponse>, ClientError> {
        self.send_json::<(), _>(
            reqwest::Method::GET,
            &format!("/administrador/rifas/boletos/{raffle_id}"),
            None,
        )
        .await
    }

    /// `POST /administrador/boletos/asignar/{rifaId}` – sell free tickets to one buyer.
    pub async fn assign_tickets(
        &self,
        raffle_id: i64,
        body: &AssignTicketsRequest,
    ) -> Result<AssignTicketsResponse, ClientError> {
        self.send_json(
            reqwest::Method::POST,
            &format!("/administrador/boletos/asignar/{raffle_id}"),
            Some(body),
        )
        .await
    }

    /// `POST /administrador/rifas/sorteo/{id}` – draw every prize at once.
    pub async fn draw(
        &self,
        raffle_id: i64,
        body: &DrawRequest,
    ) -> Result<DrawResponse, ClientError> {
        self.send_json(
            reqwest::Method::POST,
            &format!("/administrador/rifas/sorteo/{raffle_id}"),
            Some(body),
        )
        .await
    }

    /// `POST /administrador/rifas/sorteo-en-vivo/{rifaId}` – draw the next live round.
    pub async fn draw_live_round(
        &self,
        raffle_id: i64,
        body: &LiveDrawRequest,
    ) -> Result<LiveDrawResponse, ClientError> {
        self.send_json(
            reqwest::Method::POST,
            &format!("/administrador/rifas/sorteo-en-vivo/{raffle_id}"),
            Some(body),
        )
        .await
    }

    /// `DELETE /administrador/rifas/sorteo-en-vivo/{rifaId}/eventos` – drop live reveal events.
    pub async fn clear_live_events(
        &self,
        raffle_id: i64,
    ) -> Result<LiveEventsCleanupResponse, ClientError> {
        self.send_json::<(), _>(
            reqwest::Method::DELETE,
            &format!("/administrador/rifas/sorteo-en-vivo/{raffle_id}/eventos"),
            None,
        )
        .await
    }

    /// `PUT /administrador/rifas/revertir-sorteo/{id}` – undo every drawn prize.
    pub async fn revert_raffle(&self, raffle_id: i64) -> Result<RevertResponse, ClientError> {
        self.send_json::<(), _>(
            reqwest::Method::PUT,
            &format!("/administrador/rifas/revertir-sorteo/{raffle_id}"),
            None,
        )
        .await
    }

    /// `PUT /administrador/rifas/revertir-ganador/{winnerId}` – undo one prize by winner id.
    pub async fn revert_winner(&self, winner_id: i64) -> Result<RevertResponse, ClientError> {
        self.send_json::<(), _>(
            reqwest::Method::PUT,
            &format!("/administrador/rifas/revertir-ganador/{winner_id}"),
            None,
        )
        .await
    }

    /// `PUT /administrador/rifas/{id}/revertir-premio/{orden}` – undo one prize by order.
    pub async fn revert_prize(
        &self,
        raffle_id: i64,
        order: u32,
    ) -> Result<RevertResponse, ClientError> {
        self.send_json::<(), _>(
            reqwest::Method::PUT,
            &format!("/administrador/rifas/{raffle_id}/revertir-premio/{order}"),
            None,
        )
        .await
    }

    /// `PUT /administrador/rifas/{id}/revertir-boleto/{numero}` – undo one prize by winning code.
    pub async fn revert_ticket(
        &self,
        raffle_id: i64,
        code: &str,
    ) -> Result<RevertResponse, ClientError> {
        self.send_json::<(), _>(
            reqwest::Method::PUT,
            &format!("/administrador/rifas/{raffle_id}/revertir-boleto/{code}"),
            None,
        )
        .await
    }

    /// `GET /administrador/rifas/ganadores/{id}` – list winner records.
    pub async fn list_winners(&self, raffle_id: i64) -> Result<Vec<WinnerResponse>, ClientError> {
        self.send_json::<(), _>(
            reqwest::Method::GET,
            &format!("/administrador/rifas/ganadores/{raffle_id}"),
            None,
        )
        .await
    }
}

async fn parse_response<T: serde::de::DeserializeOwned>(
    resp: reqwest::Response,
) -> Result<T, ClientError> {
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(ClientError::Api { status, body });
    }
    let bytes = resp.bytes().await?;
    serde_json::from_slice(&bytes).map_err(ClientError::Json)
}
