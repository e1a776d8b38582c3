use crate::types::Phase;

/// Linear wizard order. The timed phases are not part of it; stepping from one
/// of those leaves the phase unchanged.
pub const PHASE_ORDER: [Phase; 5] = [
    Phase::Welcome,
    Phase::Coffee,
    Phase::Brewer,
    Phase::Settings,
    Phase::Results,
];

fn position(phase: Phase) -> Option<usize> {
    PHASE_ORDER.iter().position(|p| *p == phase)
}

/// Next phase in the linear order, clamped at the end
pub fn next_phase(current: Phase) -> Phase {
    match position(current) {
        Some(index) if index + 1 < PHASE_ORDER.len() => PHASE_ORDER[index + 1],
        _ => current,
    }
}

/// Previous phase in the linear order, clamped at the start
pub fn prev_phase(current: Phase) -> Phase {
    match position(current) {
        Some(index) if index > 0 => PHASE_ORDER[index - 1],
        _ => current,
    }
}
