//! Onboarding request models

use std::{collections::BTreeMap, collections::HashMap, fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::workflow::machine::{Stage, WorkflowState};

/// Free-text notes keyed by the wire name of the stage that wrote them
pub type Notes = BTreeMap<String, String>;

/// Load type of the new customer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoadType {
    #[serde(rename = "COMP")]
    Comp,
    #[serde(rename = "CROSS")]
    Cross,
    #[serde(rename = "GRUP")]
    Grup,
    #[serde(rename = "TTPRO")]
    Ttpro,
}

impl LoadType {
    pub const ALL: [LoadType; 4] = [
        LoadType::Comp,
        LoadType::Cross,
        LoadType::Grup,
        LoadType::Ttpro,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LoadType::Comp => "COMP",
            LoadType::Cross => "CROSS",
            LoadType::Grup => "GRUP",
            LoadType::Ttpro => "TTPRO",
        }
    }
}

impl FromStr for LoadType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LoadType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("Unknown load type: {}", s))
    }
}

/// Payment method agreed with the new customer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentMethod {
    #[serde(rename = "TRANSFERENCIA")]
    Transferencia,
    #[serde(rename = "RECIBO")]
    Recibo,
    #[serde(rename = "RECIBO B2B")]
    ReciboB2b,
    #[serde(rename = "CONF. CLIENTE")]
    ConfCliente,
    #[serde(rename = "CRÉDITO")]
    Credito,
}

impl PaymentMethod {
    pub const ALL: [PaymentMethod; 5] = [
        PaymentMethod::Transferencia,
        PaymentMethod::Recibo,
        PaymentMethod::ReciboB2b,
        PaymentMethod::ConfCliente,
        PaymentMethod::Credito,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Transferencia => "TRANSFERENCIA",
            PaymentMethod::Recibo => "RECIBO",
            PaymentMethod::ReciboB2b => "RECIBO B2B",
            PaymentMethod::ConfCliente => "CONF. CLIENTE",
            PaymentMethod::Credito => "CRÉDITO",
        }
    }
}

impl FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PaymentMethod::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| format!("Unknown payment method: {}", s))
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Client data captured by the commercial agent, plus the terms stamped
/// by the approval stages
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientData {
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "direccion")]
    pub address: String,
    #[serde(rename = "poblacion")]
    pub town: String,
    #[serde(rename = "codigoPostal")]
    pub postal_code: String,
    #[serde(rename = "direccionEnvio", default)]
    pub shipping_address: Option<String>,
    #[serde(rename = "poblacionEnvio", default)]
    pub shipping_town: Option<String>,
    #[serde(rename = "codigoPostalEnvio", default)]
    pub shipping_postal_code: Option<String>,
    #[serde(rename = "nombreContacto")]
    pub contact_name: String,
    #[serde(rename = "telefono")]
    pub phone: String,
    #[serde(rename = "correo")]
    pub email: String,
    pub cif_nif: String,
    #[serde(rename = "tipoCarga")]
    pub load_type: LoadType,
    #[serde(rename = "metodoPago")]
    pub payment_method: PaymentMethod,
    #[serde(rename = "solicitudCredito", default)]
    pub credit_requested: f64,
    #[serde(rename = "esAutonomo")]
    pub self_employed: bool,
    /// Uploaded document URLs keyed by document kind (`sepa`)
    #[serde(rename = "documentos", default)]
    pub documents: BTreeMap<String, Option<String>>,
    #[serde(
        rename = "marcas_aprobadas",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub approved_brands: Option<Vec<String>>,
    #[serde(
        rename = "tarifa_aprobada",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub approved_tariff: Option<String>,
    #[serde(
        rename = "termino_pago",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub payment_term: Option<String>,
}

fn required(fields: &HashMap<String, String>, key: &str) -> Result<String, String> {
    fields
        .get(key)
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .ok_or_else(|| format!("Field '{}' is required", key))
}

fn optional(fields: &HashMap<String, String>, key: &str) -> Option<String> {
    fields
        .get(key)
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn parse_bool(key: &str, value: &str) -> Result<bool, String> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(format!("Field '{}' must be a boolean", key)),
    }
}

impl ClientData {
    /// Build client data from the text fields of a submission form
    ///
    /// `sepa_url` is the stored location of the optional payment mandate.
    pub fn from_form(
        fields: &HashMap<String, String>,
        sepa_url: Option<String>,
    ) -> Result<Self, String> {
        let email = required(fields, "correo")?;
        auth::validation::validate_email(&email).map_err(|e| format!("correo: {}", e))?;

        let load_type = required(fields, "tipoCarga")?.parse()?;
        let payment_method = required(fields, "metodoPago")?.parse()?;

        let credit_requested = match optional(fields, "solicitudCredito") {
            Some(value) => value
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite() && *v >= 0.0)
                .ok_or_else(|| "Field 'solicitudCredito' must be a number".to_string())?,
            None => 0.0,
        };

        let self_employed = parse_bool("esAutonomo", &required(fields, "esAutonomo")?)?;

        let mut documents = BTreeMap::new();
        if let Some(url) = sepa_url {
            documents.insert("sepa".to_string(), Some(url));
        }

        Ok(Self {
            name: required(fields, "nombre")?,
            address: required(fields, "direccion")?,
            town: required(fields, "poblacion")?,
            postal_code: required(fields, "codigoPostal")?,
            shipping_address: optional(fields, "direccionEnvio"),
            shipping_town: optional(fields, "poblacionEnvio"),
            shipping_postal_code: optional(fields, "codigoPostalEnvio"),
            contact_name: required(fields, "nombreContacto")?,
            phone: required(fields, "telefono")?,
            email,
            cif_nif: required(fields, "cif_nif")?,
            load_type,
            payment_method,
            credit_requested,
            self_employed,
            documents,
            approved_brands: None,
            approved_tariff: None,
            payment_term: None,
        })
    }
}

/// Per-stage approval flags
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ApprovalFlags {
    pub director: bool,
    pub orders: bool,
    pub admin: bool,
}

impl ApprovalFlags {
    pub fn is_approved(&self, stage: Stage) -> bool {
        match stage {
            Stage::Director => self.director,
            Stage::Orders => self.orders,
            Stage::Admin => self.admin,
        }
    }

    pub fn approve(&mut self, stage: Stage) {
        match stage {
            Stage::Director => self.director = true,
            Stage::Orders => self.orders = true,
            Stage::Admin => self.admin = true,
        }
    }

    pub fn all(&self) -> bool {
        self.director && self.orders && self.admin
    }
}

/// When each stage approved the request
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ApprovalTimes {
    pub director: Option<DateTime<Utc>>,
    pub orders: Option<DateTime<Utc>>,
    pub admin: Option<DateTime<Utc>>,
}

impl ApprovalTimes {
    pub fn stamp(&mut self, stage: Stage, at: DateTime<Utc>) {
        match stage {
            Stage::Director => self.director = Some(at),
            Stage::Orders => self.orders = Some(at),
            Stage::Admin => self.admin = Some(at),
        }
    }
}

/// Onboarding request as stored
#[derive(Debug, Clone)]
pub struct RequestRecord {
    pub id: Uuid,
    /// Submitting commercial agent
    pub agent_id: Uuid,
    pub client: ClientData,
    pub state: WorkflowState,
    pub approvals: ApprovalFlags,
    pub approved_at: ApprovalTimes,
    pub notes: Notes,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RequestRecord {
    /// A freshly submitted request, pending the director
    pub fn submitted(agent_id: Uuid, client: ClientData, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            agent_id,
            client,
            state: WorkflowState::PendingDirector,
            approvals: ApprovalFlags::default(),
            approved_at: ApprovalTimes::default(),
            notes: Notes::new(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Public view of a request
#[derive(Debug, Clone, Serialize)]
pub struct RequestResponse {
    pub id: Uuid,
    pub comercial_id: Uuid,
    pub datos_comercial: ClientData,
    pub estado: WorkflowState,
    pub fecha_creacion: DateTime<Utc>,
    pub ultima_modificacion: DateTime<Utc>,
    pub aprobado_director: bool,
    pub aprobado_pedidos: bool,
    pub aprobado_admin: bool,
    pub notas: Notes,
}

impl From<RequestRecord> for RequestResponse {
    fn from(record: RequestRecord) -> Self {
        Self {
            id: record.id,
            comercial_id: record.agent_id,
            datos_comercial: record.client,
            estado: record.state,
            fecha_creacion: record.created_at,
            ultima_modificacion: record.updated_at,
            aprobado_director: record.approvals.director,
            aprobado_pedidos: record.approvals.orders,
            aprobado_admin: record.approvals.admin,
            notas: record.notes,
        }
    }
}

/// Body of `PUT /api/solicitudes/{id}/aprobar`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DecisionPayload {
    #[serde(rename = "aprobar", default)]
    pub approve: bool,
    #[serde(rename = "notas", default)]
    pub note: String,
    #[serde(rename = "marcas", default)]
    pub brands: Vec<String>,
    #[serde(rename = "tarifa", default)]
    pub tariff: Option<String>,
    #[serde(rename = "termino_pago", default)]
    pub payment_term: Option<String>,
}

/// Result of a decision
#[derive(Debug, Clone, Serialize)]
pub struct DecisionResponse {
    pub id: Uuid,
    pub estado: WorkflowState,
    pub mensaje: String,
}

/// Per-agent tally of requests
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RequestSummary {
    pub pendientes: i64,
    pub completadas: i64,
    pub rechazadas: i64,
}

impl RequestSummary {
    /// Fold per-state counts of live requests plus the number of archived ones
    pub fn from_counts(counts: &[(WorkflowState, i64)], archived: i64) -> Self {
        let mut summary = Self {
            completadas: archived,
            ..Self::default()
        };

        for (state, count) in counts {
            match state {
                WorkflowState::PendingDirector
                | WorkflowState::PendingOrders
                | WorkflowState::PendingAdmin => summary.pendientes += count,
                WorkflowState::Completed => summary.completadas += count,
                WorkflowState::Rejected => summary.rechazadas += count,
            }
        }

        summary
    }
}
