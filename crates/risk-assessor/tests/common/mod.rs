//! In-process fake backend shared by the integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Notify;

use risk_assessor::generation::{
    BackendFailure, GenerationBackend, GenerationRequest, GenerationResponse,
};
use risk_assessor::{GenerationClient, GenerationConfig, OverviewField, WizardController};

pub const TEST_KEY: &str = "test-key";

pub const THREE_ITEMS: &str = r#"[
    {"workType": "비계 설치", "riskFactor": "작업발판 미고정 상태에서 이동 중 추락", "riskLevel": "HIGH", "safetyMeasure": "안전난간 설치, 안전대 착용"},
    {"workType": "비계 설치", "riskFactor": "자재 인양 중 결속 불량으로 낙하", "riskLevel": "MEDIUM", "safetyMeasure": "낙하물 방지망 설치"},
    {"workType": "터파기", "riskFactor": "굴착면 경사 미확보로 토사 붕괴", "riskLevel": "LOW", "safetyMeasure": "흙막이 지보공 설치"}
]"#;

/// Returns a fixed reply, counts calls and keeps the last request.
pub struct FakeBackend {
    reply: Result<GenerationResponse, BackendFailure>,
    calls: AtomicUsize,
    last_request: Mutex<Option<(GenerationRequest, String)>>,
    gate: Option<Arc<Notify>>,
}

impl FakeBackend {
    pub fn replying(reply: Result<GenerationResponse, BackendFailure>) -> Arc<Self> {
        Arc::new(Self {
            reply,
            calls: AtomicUsize::new(0),
            last_request: Mutex::new(None),
            gate: None,
        })
    }

    pub fn with_text(text: &str) -> Arc<Self> {
        Self::replying(Ok(GenerationResponse::with_text(text)))
    }

    /// Holds every call until `gate` is notified.
    pub fn gated(text: &str, gate: Arc<Notify>) -> Arc<Self> {
        Arc::new(Self {
            reply: Ok(GenerationResponse::with_text(text)),
            calls: AtomicUsize::new(0),
            last_request: Mutex::new(None),
            gate: Some(gate),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<(GenerationRequest, String)> {
        self.last_request.lock().unwrap().clone()
    }
}

#[async_trait]
impl GenerationBackend for FakeBackend {
    async fn generate(
        &self,
        request: &GenerationRequest,
        api_key: &str,
    ) -> Result<GenerationResponse, BackendFailure> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_request.lock().unwrap() = Some((request.clone(), api_key.to_string()));
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        self.reply.clone()
    }
}

pub fn client(backend: Arc<FakeBackend>, api_key: Option<&str>) -> GenerationClient {
    let mut config = GenerationConfig::default().with_model("gemini-test");
    config.api_key = api_key.map(str::to_string);
    GenerationClient::new(config, backend)
}

pub fn wizard(backend: Arc<FakeBackend>) -> WizardController {
    WizardController::new(client(backend, Some(TEST_KEY)))
}

/// Fill the sample overview, submit it and enter `work_types`.
pub fn ready_for_analysis(wizard: &mut WizardController, work_types: &str) {
    for (field, value) in [
        (OverviewField::ProjectName, "Sample Tower"),
        (OverviewField::Location, "Seoul"),
        (OverviewField::Duration, "2024.01–2025.12"),
        (OverviewField::Description, "RC structure"),
    ] {
        wizard.update_overview_field(field, value).unwrap();
    }
    wizard.submit_overview().unwrap();
    wizard.update_work_types(work_types).unwrap();
}
