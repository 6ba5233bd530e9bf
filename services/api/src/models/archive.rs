//! Archived request models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::request::{LoadType, PaymentMethod};

/// Client identity kept in the archive
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArchivedClient {
    pub nombre: String,
    pub cif_nif: String,
    pub tipo_carga: LoadType,
    pub metodo_pago: PaymentMethod,
}

/// Notes left by each stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArchivedProcess {
    pub director: Option<String>,
    pub pedidos: Option<String>,
    pub admin: Option<String>,
}

/// Condensed snapshot stored in `resumen`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArchiveSummary {
    pub cliente: ArchivedClient,
    pub proceso: ArchivedProcess,
}

/// Immutable record of a completed request
#[derive(Debug, Clone, Serialize)]
pub struct ArchivedRequest {
    pub id: Uuid,
    #[serde(rename = "solicitud_original_id")]
    pub original_request_id: Uuid,
    #[serde(rename = "resumen")]
    pub summary: ArchiveSummary,
    #[serde(rename = "fecha_creacion")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "fecha_aprobacion_director")]
    pub director_approved_at: Option<DateTime<Utc>>,
    #[serde(rename = "fecha_aprobacion_pedidos")]
    pub orders_approved_at: Option<DateTime<Utc>>,
    #[serde(rename = "fecha_aprobacion_admin")]
    pub admin_approved_at: Option<DateTime<Utc>>,
    #[serde(rename = "comercial_email")]
    pub agent_email: String,
    #[serde(rename = "cliente_nombre")]
    pub client_name: String,
    #[serde(rename = "archivado_en")]
    pub archived_at: DateTime<Utc>,
}
