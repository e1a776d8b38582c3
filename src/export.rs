//! Export of brew data as context for an AI assistant

use crate::calc::{format_brew_time, with_days_off_roast, with_ratio};
use crate::journal::{BrewFilter, BrewJournal, BrewWithRatio, BrewerRecord, CoffeeWithDaysOffRoast};
use anyhow::bail;
use log::debug;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Equipment {
    pub grinder: Option<String>,
    pub kettle: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiExport {
    pub equipment: Equipment,
    pub brewer: Option<BrewerRecord>,
    pub coffee: Option<CoffeeWithDaysOffRoast>,
    pub current_brew: Option<BrewWithRatio>,
    pub recent_brews: Vec<BrewWithRatio>,
    pub prompt_context: String,
}

/// What the export is about
#[derive(Debug, Clone, PartialEq)]
pub enum ExportTarget {
    /// A specific brew; history is the coffee's other brews
    Brew(String),
    /// The coffee's newest brew; history is the ones before it
    Coffee(String),
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

// Absent numbers render as "-"
fn num<T: std::fmt::Display>(value: Option<T>) -> String {
    value.map_or_else(|| "-".to_string(), |v| v.to_string())
}

/// Markdown prompt asking for an analysis of the current brew
pub fn prompt_context(
    equipment: &Equipment,
    brewer: Option<&BrewerRecord>,
    coffee: Option<&CoffeeWithDaysOffRoast>,
    current_brew: Option<&BrewWithRatio>,
    recent_brews: &[BrewWithRatio],
) -> String {
    let mut lines: Vec<String> = Vec::new();
    lines.push("# Coffee Brew Analysis Request\n".to_string());

    let grinder = non_empty(equipment.grinder.as_deref());
    let kettle = non_empty(equipment.kettle.as_deref());
    if grinder.is_some() || kettle.is_some() {
        lines.push("## Equipment".to_string());
        if let Some(grinder) = grinder {
            lines.push(format!("- Grinder: {}", grinder));
        }
        if let Some(kettle) = kettle {
            lines.push(format!("- Kettle: {}", kettle));
        }
        lines.push(String::new());
    }

    if let Some(brewer) = brewer {
        lines.push("## Brewer".to_string());
        lines.push(format!("- {} ({})", brewer.name, brewer.brewer_type.as_str()));
        if let Some(filter) = non_empty(brewer.filter_type.as_deref()) {
            lines.push(format!("- Filter: {}", filter));
        }
        lines.push(String::new());
    }

    if let Some(decorated) = coffee {
        let coffee = &decorated.coffee;
        lines.push("## Coffee".to_string());
        lines.push(format!("- {} by {}", coffee.name, coffee.roaster));
        if let Some(origin) = non_empty(coffee.origin.as_deref()) {
            lines.push(format!("- Origin: {}", origin));
        }
        if let Some(process) = coffee.process {
            lines.push(format!("- Process: {}", process.as_str()));
        }
        if let Some(roast) = coffee.roast_level {
            lines.push(format!("- Roast: {}", roast.as_str()));
        }
        if let Some(days) = decorated.days_off_roast {
            lines.push(format!("- Days off roast: {}", days));
        }
        if !coffee.flavor_notes.is_empty() {
            lines.push(format!(
                "- Tasting notes (bag): {}",
                coffee.flavor_notes.join(", ")
            ));
        }
        lines.push(String::new());
    }

    if let Some(current) = current_brew {
        let brew = &current.brew;
        lines.push("## Current Brew".to_string());
        lines.push(format!("- Dose: {}g", num(brew.dose_g)));
        lines.push(format!("- Water: {}g", num(brew.water_g)));
        if let Some(ratio) = &current.ratio {
            lines.push(format!("- Ratio: {}", ratio));
        }
        if let Some(grind) = brew.grind_setting {
            lines.push(format!("- Grind: {}", grind));
        }
        if let Some(temp) = brew.water_temp_c {
            lines.push(format!("- Water temp: {}°C", temp));
        }
        if let Some(bloom) = brew.bloom_water_g {
            lines.push(format!("- Bloom: {}g for {}s", bloom, num(brew.bloom_time_s)));
        }
        if brew.total_time_s.is_some() {
            lines.push(format!("- Total time: {}", format_brew_time(brew.total_time_s)));
        }
        if let Some(rating) = brew.rating {
            lines.push(format!("- Rating: {}/5", rating));
        }
        if !brew.tasting_notes.is_empty() {
            lines.push(format!("- Tasting notes: {}", brew.tasting_notes.join(", ")));
        }
        if let Some(feedback) = non_empty(brew.feedback.as_deref()) {
            lines.push(format!("- Feedback: {}", feedback));
        }
        if let Some(goal) = non_empty(brew.goal.as_deref()) {
            lines.push(format!("- Goal for next brew: {}", goal));
        }
        lines.push(String::new());
    }

    if !recent_brews.is_empty() {
        lines.push("## Recent Brew History".to_string());
        for (i, recent) in recent_brews.iter().enumerate() {
            let brew = &recent.brew;
            lines.push(format!("\n### Brew {}", i + 1));
            lines.push(format!(
                "- {}g / {}g ({})",
                num(brew.dose_g),
                num(brew.water_g),
                num(recent.ratio.as_deref())
            ));
            if let Some(grind) = brew.grind_setting {
                lines.push(format!("- Grind: {}", grind));
            }
            if brew.total_time_s.is_some() {
                lines.push(format!("- Time: {}", format_brew_time(brew.total_time_s)));
            }
            if let Some(rating) = brew.rating {
                lines.push(format!("- Rating: {}/5", rating));
            }
            if let Some(feedback) = non_empty(brew.feedback.as_deref()) {
                lines.push(format!("- Notes: {}", feedback));
            }
        }
        lines.push(String::new());
    }

    lines.push("---".to_string());
    lines.push("Please analyze this brew and suggest improvements for the next attempt.".to_string());

    lines.join("\n")
}

/// Gather everything about `target` from the journal and render the prompt
pub async fn build_export<J: BrewJournal>(
    journal: &J,
    target: &ExportTarget,
    include_history: usize,
) -> anyhow::Result<AiExport> {
    let equipment = match journal.user_settings().await? {
        Some(settings) => Equipment {
            grinder: settings.grinder.filter(|g| !g.is_empty()),
            kettle: settings.kettle.filter(|k| !k.is_empty()),
        },
        None => Equipment::default(),
    };

    let mut current_brew = None;
    let mut recent_brews = Vec::new();
    let coffee;

    match target {
        ExportTarget::Brew(brew_id) => {
            let Some(brew) = journal.brew(brew_id).await? else {
                bail!("Brew not found");
            };
            coffee = journal.coffee(&brew.coffee_id).await?;
            if include_history > 0 {
                let filter = BrewFilter {
                    coffee_id: Some(brew.coffee_id.clone()),
                    limit: include_history + 1,
                    ..BrewFilter::default()
                };
                recent_brews = journal
                    .list_brews(&filter)
                    .await?
                    .into_iter()
                    .filter(|b| b.id != *brew_id)
                    .take(include_history)
                    .map(with_ratio)
                    .collect();
            }
            current_brew = Some(with_ratio(brew));
        }
        ExportTarget::Coffee(coffee_id) => {
            let Some(found) = journal.coffee(coffee_id).await? else {
                bail!("Coffee not found");
            };
            coffee = Some(found);
            let filter = BrewFilter {
                coffee_id: Some(coffee_id.clone()),
                limit: include_history + 1,
                ..BrewFilter::default()
            };
            let mut brews = journal.list_brews(&filter).await?.into_iter();
            if let Some(latest) = brews.next() {
                current_brew = Some(with_ratio(latest));
                recent_brews = brews.map(with_ratio).collect();
            }
        }
    }

    let brewer = match current_brew.as_ref().and_then(|c| c.brew.brewer_id.as_deref()) {
        Some(id) => journal.brewer(id).await?,
        None => None,
    };
    let coffee = coffee.map(with_days_off_roast);

    debug!(
        "AI export with {} history brews (brewer: {})",
        recent_brews.len(),
        brewer.is_some()
    );

    let prompt_context = prompt_context(
        &equipment,
        brewer.as_ref(),
        coffee.as_ref(),
        current_brew.as_ref(),
        &recent_brews,
    );

    Ok(AiExport {
        equipment,
        brewer,
        coffee,
        current_brew,
        recent_brews,
        prompt_context,
    })
}
