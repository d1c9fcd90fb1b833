use crate::game::chart::Chart;
use crate::game::events::{EngineEvent, EventQueue};
use crate::game::note::{NoteFlags, NoteIndex};
use crate::game::stats::EngineStats;
use crate::game::timing::TimeBase;
use log::{debug, info};

/// Meter gained for completing one phrase.
pub const STAR_POWER_PHRASE_AMOUNT: f64 = 0.25;

pub fn award(stats: &mut EngineStats, events: &mut EventQueue, head: NoteIndex) {
    stats.star_power_amount = (stats.star_power_amount + STAR_POWER_PHRASE_AMOUNT).min(1.0);
    stats.phrases_hit += 1;
    debug!("Star power phrase hit at note {head}, meter {:.2}", stats.star_power_amount);
    events.push(EngineEvent::StarPowerPhraseHit { index: head });
}

/// Voids the whole phrase containing `index` after a miss.
///
/// Returns false when the note was not part of an intact phrase, so a phrase
/// is only ever counted as missed once.
pub fn strip(chart: &mut Chart, stats: &mut EngineStats, events: &mut EventQueue, index: NoteIndex) -> bool {
    let head = chart.note(index).parent.unwrap_or(index);
    if !chart.note(head).is_star_power() {
        return false;
    }

    stats.phrases_missed += 1;
    clear_chord(chart, head);

    if !chart.note(head).is_star_power_start() {
        let mut prev = chart.note(head).prev;
        while let Some(p) = prev {
            if !chart.note(p).is_star_power() {
                break;
            }
            clear_chord(chart, p);
            if chart.note(p).is_star_power_start() {
                break;
            }
            prev = chart.note(p).prev;
        }
    }

    if !chart.note(head).is_star_power_end() {
        let mut next = chart.note(head).next;
        while let Some(n) = next {
            if !chart.note(n).is_star_power() {
                break;
            }
            clear_chord(chart, n);
            if chart.note(n).is_star_power_end() {
                break;
            }
            next = chart.note(n).next;
        }
    }

    debug!("Star power phrase missed at note {head}");
    events.push(EngineEvent::StarPowerPhraseMissed { index: head });
    true
}

fn clear_chord(chart: &mut Chart, head: NoteIndex) {
    let children = chart.note(head).children.clone();
    chart.note_mut(head).flags.remove(NoteFlags::STAR_POWER);
    for child in children {
        chart.note_mut(child).flags.remove(NoteFlags::STAR_POWER);
    }
}

/// Meter level at the tick it was last set while active. Every later level
/// is derived from this point, so it depends only on the current tick and
/// never on how many updates ran in between.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct MeterAnchor {
    pub amount: f64,
    pub tick: u32,
}

impl MeterAnchor {
    pub const fn new(amount: f64, tick: u32) -> Self {
        Self { amount, tick }
    }
}

/// Meter used between two ticks. The span is split at every time-signature
/// change and each piece drains over its own eight-measure window.
pub fn drained_between<T: TimeBase + ?Sized>(sync: &T, from_tick: u32, to_tick: u32) -> f64 {
    let resolution = sync.resolution();
    let sigs = sync.time_signatures();
    let mut used = 0.0;
    for (i, sig) in sigs.iter().enumerate() {
        let sig_end = sigs.get(i + 1).map_or(u32::MAX, |next| next.tick);
        let start = sig.tick.max(from_tick);
        let end = sig_end.min(to_tick);
        let window = sig.ticks_every_eight_measures(resolution);
        if end > start && window > 0 {
            used += f64::from(end - start) / f64::from(window);
        }
    }
    used
}

/// Sets the active meter to `anchor.amount - drained`. Returns true if star
/// power ran out.
pub fn deplete(stats: &mut EngineStats, events: &mut EventQueue, anchor: MeterAnchor, drained: f64) -> bool {
    if !stats.is_star_power_active {
        return false;
    }
    stats.star_power_amount = anchor.amount - drained;
    if stats.star_power_amount <= 0.0 {
        stats.star_power_amount = 0.0;
        stats.is_star_power_active = false;
        info!("Star power depleted");
        events.push(EngineEvent::StarPowerStatus { active: false });
        return true;
    }
    false
}

/// Returns true on an off -> on transition.
pub fn activate(stats: &mut EngineStats, events: &mut EventQueue) -> bool {
    if stats.is_star_power_active {
        return false;
    }
    stats.is_star_power_active = true;
    info!("Star power activated with meter {:.2}", stats.star_power_amount);
    events.push(EngineEvent::StarPowerStatus { active: true });
    true
}
