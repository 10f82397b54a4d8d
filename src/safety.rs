//! Hazard detection over conversation transcripts.
//!
//! The conversation brief already tells the model to lead with safety advice.
//! This module only spots the same situations so the service can log them;
//! it never rewrites the transcript or the reply.

use std::sync::LazyLock;

use regex::Regex;

use crate::llm::{ChatMessage, Role};

/// Situations that trigger the safety override.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hazard {
    GasOdour,
    CarbonMonoxideAlarm,
    WaterOnElectrics,
    BurningSmell,
    Sparking,
}

impl Hazard {
    pub fn as_str(&self) -> &'static str {
        match self {
            Hazard::GasOdour => "gas_odour",
            Hazard::CarbonMonoxideAlarm => "carbon_monoxide_alarm",
            Hazard::WaterOnElectrics => "water_on_electrics",
            Hazard::BurningSmell => "burning_smell",
            Hazard::Sparking => "sparking",
        }
    }
}

static PATTERNS: LazyLock<Vec<(Hazard, Regex)>> = LazyLock::new(|| {
    [
        (Hazard::GasOdour, r"(?i)\b(smell(s|ing)? (of )?gas|gas (smell|leak)|smells? like gas)\b"),
        (Hazard::CarbonMonoxideAlarm, r"(?i)\b(carbon monoxide|co alarm|co detector)\b"),
        (
            Hazard::WaterOnElectrics,
            r"(?i)\bwater\b.{0,60}\b(socket|sockets|electrics|electrical|fuse ?box|consumer unit|light fitting|wiring)\b",
        ),
        (Hazard::BurningSmell, r"(?i)\b(burning smell|smell(s|ing)? (of )?burning|smells? like burning)\b"),
        (Hazard::Sparking, r"(?i)\b(spark|sparks|sparking|sparked)\b"),
    ]
    .into_iter()
    .filter_map(|(hazard, pattern)| Regex::new(pattern).ok().map(|re| (hazard, re)))
    .collect()
});

/// Hazards mentioned in a single piece of text, in declaration order.
pub fn detect(text: &str) -> Vec<Hazard> {
    PATTERNS
        .iter()
        .filter(|(_, re)| re.is_match(text))
        .map(|(hazard, _)| *hazard)
        .collect()
}

/// Hazards mentioned anywhere in the customer's side of a transcript.
pub fn detect_in_transcript(transcript: &[ChatMessage]) -> Vec<Hazard> {
    let mut found = Vec::new();
    for message in transcript.iter().filter(|m| m.role == Role::User) {
        for hazard in detect(&message.content) {
            if !found.contains(&hazard) {
                found.push(hazard);
            }
        }
    }
    found
}
