//! Tipos de dados para as respostas do endpoint de perfil.
//!
//! O payload segue o formato `data.user.edge_owner_to_timeline_media.edges[].node`.
//! Níveis ausentes ou `null` são tratados como "sem posts"; só um corpo que não
//! seja JSON, ou com tipos incompatíveis, é considerado inválido.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Corpo de resposta de sucesso do endpoint de perfil.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfileResponse {
    #[serde(default)]
    pub data: Option<ProfileData>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfileData {
    #[serde(default)]
    pub user: Option<ProfileUser>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfileUser {
    /// Linha do tempo de mídias publicadas pelo perfil.
    #[serde(default)]
    pub edge_owner_to_timeline_media: Option<Timeline>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Timeline {
    #[serde(default)]
    pub edges: Vec<Edge>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Edge {
    #[serde(default)]
    pub node: Option<Post>,
}

/// Um post individual. Só o timestamp (segundos Unix) interessa aqui.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Post {
    #[serde(default)]
    pub taken_at_timestamp: Option<i64>,
}

/// Resultado de uma consulta bem-sucedida, já reduzido ao que o checker grava.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LatestPost {
    /// Data (UTC) do post mais recente.
    Date(String),
    /// O perfil existe mas não tem posts com timestamp.
    NoPosts,
}

pub const NO_POSTS: &str = "No posts found";

impl ProfileResponse {
    /// Iterador sobre os timestamps presentes (zero é ignorado).
    pub fn timestamps(&self) -> impl Iterator<Item = i64> + '_ {
        self.data
            .iter()
            .filter_map(|d| d.user.as_ref())
            .filter_map(|u| u.edge_owner_to_timeline_media.as_ref())
            .flat_map(|t| t.edges.iter())
            .filter_map(|e| e.node.as_ref())
            .filter_map(|n| n.taken_at_timestamp)
            .filter(|ts| *ts != 0)
    }

    /// Maior timestamp entre todos os posts retornados.
    pub fn latest_timestamp(&self) -> Option<i64> {
        self.timestamps().max()
    }

    /// Reduz a resposta à data do post mais recente, formatada como `YYYY-MM-DD`.
    ///
    /// Retorna `None` se o timestamp estiver fora do intervalo representável.
    pub fn latest_post(&self) -> Option<LatestPost> {
        match self.latest_timestamp() {
            None => Some(LatestPost::NoPosts),
            Some(ts) => DateTime::<Utc>::from_timestamp(ts, 0)
                .map(|dt| LatestPost::Date(dt.format("%Y-%m-%d").to_string())),
        }
    }
}

impl LatestPost {
    pub fn into_value(self) -> String {
        match self {
            LatestPost::Date(date) => date,
            LatestPost::NoPosts => NO_POSTS.to_string(),
        }
    }
}
