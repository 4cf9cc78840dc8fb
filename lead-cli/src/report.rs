//! Plain-text renderings printed by the commands.

use std::fmt;

use lead_core::{EstimateResult, Lead, StepDefinition, StepId};

use crate::script::{Outcome, TraceLine};

pub struct StepList<'a> {
    pub steps: &'a [&'a StepDefinition],
    pub current: Option<StepId>,
}

impl fmt::Display for StepList<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, step) in self.steps.iter().enumerate() {
            let marker = if Some(step.id) == self.current { ">" } else { " " };
            writeln!(
                f,
                "{marker} {:>2}. {:<26} [{}]",
                index + 1,
                step.id.as_str(),
                step.module.as_str()
            )?;
        }
        Ok(())
    }
}

pub struct EstimateReport<'a>(pub &'a EstimateResult);

impl fmt::Display for EstimateReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let estimate = self.0;
        writeln!(f, "Estimate: {} - {} EUR", estimate.min, estimate.max)?;
        writeln!(f, "Midpoint: {} EUR", estimate.midpoint)?;
        if let Some(kwp) = estimate.photovoltaic_kwp {
            writeln!(f, "Photovoltaic plant: {kwp} kWp")?;
        }
        writeln!(f, "Breakdown:")?;
        for (component, amount) in &estimate.breakdown {
            writeln!(f, "  {:<28} {:>12}", component.label(), amount)?;
        }
        if !estimate.deductions.is_empty() {
            writeln!(f, "Tax deductions (not subtracted):")?;
            for (component, amount) in &estimate.deductions {
                writeln!(f, "  {:<28} {:>12}", component.label(), amount)?;
            }
            writeln!(f, "  {:<28} {:>12}", "Total", estimate.total_deductions())?;
        }
        Ok(())
    }
}

pub struct Trace<'a>(pub &'a [TraceLine]);

impl fmt::Display for Trace<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in self.0 {
            let outcome = match &line.outcome {
                Outcome::Moved => "moved",
                Outcome::AtEnd => "at end",
                Outcome::AtStart => "at start",
                Outcome::Restarted => "restarted",
                Outcome::RoutedBack(reason) => reason.as_str(),
            };
            writeln!(
                f,
                "#{:<3} {:<8} -> {:<26} ({outcome})",
                line.index,
                line.action,
                line.step.as_str()
            )?;
        }
        Ok(())
    }
}

/// One line per lead, for `leads list`.
pub struct LeadTable<'a>(pub &'a [Lead]);

impl fmt::Display for LeadTable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return writeln!(f, "no leads");
        }
        for lead in self.0 {
            let name = lead.form.contact.full_name.as_deref().unwrap_or("-");
            writeln!(
                f,
                "{:>5}  {:<11} {:<24} {:>12}  {}",
                lead.id,
                lead.status.as_str(),
                name,
                lead.estimate.midpoint,
                lead.created_at.format("%Y-%m-%d")
            )?;
        }
        Ok(())
    }
}

pub struct LeadDetail<'a>(pub &'a Lead);

impl fmt::Display for LeadDetail<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let lead = self.0;
        let contact = &lead.form.contact;
        writeln!(f, "Lead #{} ({})", lead.id, lead.status.as_str())?;
        writeln!(f, "Created: {}", lead.created_at.to_rfc3339())?;
        writeln!(f, "Updated: {}", lead.updated_at.to_rfc3339())?;
        for (label, value) in [
            ("Name", &contact.full_name),
            ("Email", &contact.email),
            ("Phone", &contact.phone),
            ("Notes", &contact.notes),
        ] {
            if let Some(value) = value {
                writeln!(f, "{label}: {value}")?;
            }
        }
        write!(f, "{}", EstimateReport(&lead.estimate))
    }
}
