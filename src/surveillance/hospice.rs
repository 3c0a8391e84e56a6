//! Comfort-focused guidance for hospice and comfort-measures-only patients.

const COMFORT_MEASURES: &[(&str, &[&str])] = &[
    (
        "nausea",
        &[
            "Small, frequent sips of clear fluids",
            "Anti-nausea medication as ordered",
            "Cool cloth to forehead",
            "Quiet, calm environment",
            "Avoid strong odors",
        ],
    ),
    (
        "vomiting",
        &[
            "Position on side to prevent aspiration",
            "Oral care after episodes",
            "Anti-emetic medication as ordered",
            "Small ice chips if tolerated",
        ],
    ),
    (
        "pain",
        &[
            "Pain medication as ordered, do not delay",
            "Comfort positioning",
            "Massage or gentle touch if desired",
            "Quiet, dimmed environment",
            "Music or spiritual support if patient desires",
        ],
    ),
    (
        "dyspnea",
        &[
            "Elevate head of bed",
            "Fan directed toward face",
            "Oxygen for comfort, not to prolong life",
            "Morphine for air hunger as ordered",
            "Calm, reassuring presence",
        ],
    ),
    (
        "agitation",
        &[
            "Calm, soothing environment",
            "Familiar voices, music, or items",
            "Anti-anxiety medication as ordered",
            "Gentle reorientation",
            "Family or spiritual support presence",
        ],
    ),
    (
        "confusion",
        &[
            "Do not force reorientation if distressing",
            "Provide reassurance and comfort",
            "Ensure safety (bed alarm, supervision)",
            "Consider medication review for delirium",
            "Allow family to stay at bedside",
        ],
    ),
];

const GENERAL_GUIDANCE: &[&str] = &[
    "Prioritize comfort over labs and tests",
    "Medication changes should enhance quality of life",
    "Coordinate with hospice nurse before changes",
    "Keep family informed and involved in decisions",
    "Document interventions and patient response",
];

const HOSPICE_TEAM_GUIDANCE: &[&str] = &[
    "Contact hospice nurse for medication adjustments",
    "Hospice can provide additional comfort medications",
    "Do not call emergency services unless specifically requested by family",
    "Do not transfer to hospital, per advance directives",
];

/// Comfort measures for each matched symptom, then fixed general and
/// hospice-team guidance. One entry per display line.
pub fn comfort_guidance(matching_symptoms: &[String]) -> Vec<String> {
    let mut lines = vec![
        "HOSPICE COMFORT MEASURES".to_string(),
        "Focus: symptom relief and quality of life".to_string(),
    ];

    for symptom in matching_symptoms {
        let lower = symptom.to_lowercase();
        for (key, measures) in COMFORT_MEASURES {
            if lower.contains(key) {
                lines.push(format!("For {symptom}:"));
                lines.extend(measures.iter().map(|m| format!("  - {m}")));
            }
        }
    }

    lines.push("General hospice considerations:".to_string());
    lines.extend(GENERAL_GUIDANCE.iter().map(|g| format!("  - {g}")));
    lines.push("Coordinate with hospice team:".to_string());
    lines.extend(HOSPICE_TEAM_GUIDANCE.iter().map(|g| format!("  - {g}")));
    lines
}
