use std::collections::HashMap;

use crate::detect::{
    CheckboxDetector, DateDetector, Detector, DropdownDetector, RadioDetector, TextDetector, TimeDetector,
};
use crate::field::field_model::FieldCategory;
use crate::fill::{
    CheckboxFiller, DateFiller, DropdownFiller, Filler, RadioFiller, TextFiller, TimeFiller, Timing,
};

/// Detectors in run order plus the filler for each category.
///
/// Built once by whoever owns the orchestrator and passed around by
/// reference; nothing here is global.
pub struct Registry {
    detectors: Vec<Box<dyn Detector>>,
    fillers: HashMap<FieldCategory, Box<dyn Filler>>,
}

impl Registry {
    pub fn empty() -> Self {
        Registry {
            detectors: Vec::new(),
            fillers: HashMap::new(),
        }
    }

    /// Every detector and filler this crate ships, wired to `timing`.
    pub fn standard(timing: &Timing) -> Self {
        Registry::empty()
            .with_detector(TextDetector::short_text())
            .with_detector(TextDetector::paragraph())
            .with_detector(RadioDetector)
            .with_detector(CheckboxDetector)
            .with_detector(DropdownDetector)
            .with_detector(DateDetector)
            .with_detector(TimeDetector)
            .with_filler(TextFiller::short_text(timing.clone()))
            .with_filler(TextFiller::paragraph(timing.clone()))
            .with_filler(RadioFiller::new(timing.clone()))
            .with_filler(CheckboxFiller::new(timing.clone()))
            .with_filler(DropdownFiller::new(timing.clone()))
            .with_filler(DateFiller::new(timing.clone()))
            .with_filler(TimeFiller::new(timing.clone()))
    }

    pub fn with_detector(mut self, detector: impl Detector + 'static) -> Self {
        self.detectors.push(Box::new(detector));
        self
    }

    /// Registers `filler` for its category, replacing any previous one.
    pub fn with_filler(mut self, filler: impl Filler + 'static) -> Self {
        self.fillers.insert(filler.category(), Box::new(filler));
        self
    }

    pub fn detectors(&self) -> &[Box<dyn Detector>] {
        &self.detectors
    }

    pub fn filler_for(&self, category: FieldCategory) -> Option<&dyn Filler> {
        self.fillers.get(&category).map(|f| f.as_ref())
    }
}
