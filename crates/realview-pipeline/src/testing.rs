//! Deterministic scripted capability for pipeline tests.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use realview_ai::{InferenceCapability, InferenceError};
use realview_core::{
    ConsolidatedFeature, FeatureId, FeatureObservation, GatingResult, ImageAsset,
    RoomConsolidation, RoomType, Severity,
};

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Call {
    Classify(String),
    Detect(String),
    Consolidate(RoomType, Vec<String>),
}

/// Answers from per-filename scripts and records every call in order.
///
/// Unscripted images classify as `unknown`, not actionable. Consolidation
/// confirms every feature detected on any image of the chunk, once, with the
/// contributing filenames as evidence.
#[derive(Default)]
pub(crate) struct ScriptedCapability {
    gating: HashMap<String, GatingResult>,
    features: HashMap<String, Vec<FeatureObservation>>,
    failing: HashSet<String>,
    failing_detection: HashSet<String>,
    failing_consolidation: HashSet<String>,
    detection_delay: HashMap<String, Duration>,
    detections_in_flight: AtomicUsize,
    peak_detections: AtomicUsize,
    calls: Mutex<Vec<Call>>,
}

impl ScriptedCapability {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn gate(
        mut self,
        filename: &str,
        room_type: RoomType,
        actionable: bool,
        confidence: f32,
    ) -> Self {
        self.gating.insert(
            filename.to_string(),
            GatingResult {
                room_type,
                actionable,
                confidence,
            },
        );
        self
    }

    pub(crate) fn mold(mut self, filename: &str) -> Self {
        self.features
            .entry(filename.to_string())
            .or_default()
            .push(FeatureObservation {
                feature_id: FeatureId::Mold,
                severity: Severity::Medium,
                confidence: 0.7,
                explanation: format!("mold visible in {filename}"),
            });
        self
    }

    /// Every call touching `filename` fails.
    pub(crate) fn failing(mut self, filename: &str) -> Self {
        self.failing.insert(filename.to_string());
        self
    }

    pub(crate) fn failing_detection(mut self, filename: &str) -> Self {
        self.failing_detection.insert(filename.to_string());
        self
    }

    pub(crate) fn failing_consolidation(mut self, filename: &str) -> Self {
        self.failing_consolidation.insert(filename.to_string());
        self
    }

    /// Detection for `filename` takes `delay` on the tokio clock.
    pub(crate) fn slow(mut self, filename: &str, delay: Duration) -> Self {
        self.detection_delay.insert(filename.to_string(), delay);
        self
    }

    /// Most detection calls ever awaiting at the same time.
    pub(crate) fn peak_detections(&self) -> usize {
        self.peak_detections.load(Ordering::SeqCst)
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| pred(c)).count()
    }

    fn check(&self, filename: &str, stage: &HashSet<String>) -> Result<(), InferenceError> {
        if self.failing.contains(filename) || stage.contains(filename) {
            Err(InferenceError::RetriesExhausted {
                attempts: 4,
                last: Box::new(InferenceError::Server {
                    status: 500,
                    body: "boom".into(),
                }),
            })
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl InferenceCapability for ScriptedCapability {
    async fn classify(&self, image: &ImageAsset) -> Result<GatingResult, InferenceError> {
        self.calls.lock().unwrap().push(Call::Classify(image.filename.clone()));
        self.check(&image.filename, &HashSet::new())?;
        Ok(self
            .gating
            .get(&image.filename)
            .copied()
            .unwrap_or(GatingResult {
                room_type: RoomType::Unknown,
                actionable: false,
                confidence: 0.1,
            }))
    }

    async fn detect_features(
        &self,
        image: &ImageAsset,
    ) -> Result<Vec<FeatureObservation>, InferenceError> {
        self.calls.lock().unwrap().push(Call::Detect(image.filename.clone()));
        self.check(&image.filename, &self.failing_detection)?;

        let now = self.detections_in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_detections.fetch_max(now, Ordering::SeqCst);
        if let Some(delay) = self.detection_delay.get(&image.filename) {
            tokio::time::sleep(*delay).await;
        }
        self.detections_in_flight.fetch_sub(1, Ordering::SeqCst);

        Ok(self.features.get(&image.filename).cloned().unwrap_or_default())
    }

    async fn consolidate(
        &self,
        room_type: RoomType,
        images: &[&ImageAsset],
    ) -> Result<RoomConsolidation, InferenceError> {
        let names: Vec<String> = images.iter().map(|i| i.filename.clone()).collect();
        self.calls
            .lock()
            .unwrap()
            .push(Call::Consolidate(room_type, names.clone()));
        for name in &names {
            self.check(name, &self.failing_consolidation)?;
        }

        let mut confirmed: Vec<ConsolidatedFeature> = Vec::new();
        for name in &names {
            for obs in self.features.get(name).into_iter().flatten() {
                match confirmed.iter_mut().find(|c| c.feature_id == obs.feature_id) {
                    Some(existing) => {
                        existing.evidence.push_str(", ");
                        existing.evidence.push_str(name);
                    }
                    None => confirmed.push(ConsolidatedFeature {
                        feature_id: obs.feature_id,
                        severity: obs.severity,
                        confidence: obs.confidence,
                        evidence: name.clone(),
                    }),
                }
            }
        }

        Ok(RoomConsolidation {
            room_type,
            confirmed_features: confirmed,
        })
    }
}

pub(crate) fn asset(filename: &str) -> ImageAsset {
    ImageAsset::new(filename, "prop-1", format!("data:image/jpeg;base64,{filename}"))
}
