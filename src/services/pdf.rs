//! A4 record export for a single pet.

use std::sync::Arc;

use chrono::NaiveDateTime;
use printpdf::*;

use crate::db::{
    DateRange, Meal, MealRepository, Pet, PetMeta, PetMetaRepository, PetTrait,
    PetTraitRepository, User, Walk, WalkRepository,
};
use crate::error::{AppError, AppResult};
use crate::i18n;
use crate::services::access::{AccessService, Role};
use crate::AppState;

// ============================================================================
// Layout
// ============================================================================

const PAGE_WIDTH: f32 = 210.0;
const PAGE_HEIGHT: f32 = 297.0;
const MARGIN_LEFT: f32 = 20.0;
const MARGIN_TOP: f32 = 20.0;
const CONTENT_BOTTOM: f32 = 25.0;
const FOOTER_Y: f32 = 12.0;
/// Rough character budget for a 10pt Helvetica line across the content width.
const WRAP_CHARS: usize = 95;

const COLOR_BLACK: (u8, u8, u8) = (0, 0, 0);
const COLOR_TITLE: (u8, u8, u8) = (59, 130, 246);
const COLOR_MUTED: (u8, u8, u8) = (107, 114, 128);
const COLOR_RULE: (u8, u8, u8) = (209, 213, 219);

/// Everything printed in a report.
pub struct PetReport {
    pub pet: Pet,
    pub range: DateRange,
    pub walks: Vec<Walk>,
    pub meals: Vec<Meal>,
    pub traits: Vec<PetTrait>,
    pub meta: Vec<PetMeta>,
}

fn rgb(color: (u8, u8, u8)) -> Color {
    Color::Rgb(Rgb::new(
        color.0 as f32 / 255.0,
        color.1 as f32 / 255.0,
        color.2 as f32 / 255.0,
        None,
    ))
}

fn wrap(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        if !current.is_empty() && current.chars().count() + 1 + word.chars().count() > width {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

fn fmt_time(dt: &NaiveDateTime) -> String {
    dt.format("%Y-%m-%d %H:%M").to_string()
}

/// Page cursor that starts a new page (with footer) whenever content would
/// run into the bottom margin.
struct Writer {
    doc: PdfDocumentReference,
    layer: PdfLayerReference,
    font: IndirectFontRef,
    font_bold: IndirectFontRef,
    footer: String,
    page: usize,
    y: f32,
}

impl Writer {
    fn new(title: &str) -> AppResult<Self> {
        let (doc, page, layer) = PdfDocument::new(title, Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
        let font = doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(|e| AppError::Pdf(e.to_string()))?;
        let font_bold = doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(|e| AppError::Pdf(e.to_string()))?;
        let layer = doc.get_page(page).get_layer(layer);

        let writer = Self {
            doc,
            layer,
            font,
            font_bold,
            footer: i18n::t("pdf.footer"),
            page: 1,
            y: PAGE_HEIGHT - MARGIN_TOP,
        };
        writer.draw_footer();
        Ok(writer)
    }

    fn draw_footer(&self) {
        self.layer.set_fill_color(rgb(COLOR_MUTED));
        self.layer
            .use_text(&self.footer, 8.0, Mm(MARGIN_LEFT), Mm(FOOTER_Y), &self.font);
        self.layer.use_text(
            format!("{}", self.page),
            8.0,
            Mm(PAGE_WIDTH - MARGIN_LEFT - 5.0),
            Mm(FOOTER_Y),
            &self.font,
        );
    }

    fn ensure_space(&mut self, height: f32) {
        if self.y - height >= CONTENT_BOTTOM {
            return;
        }
        self.page += 1;
        let (page, layer) = self.doc.add_page(
            Mm(PAGE_WIDTH),
            Mm(PAGE_HEIGHT),
            format!("Page {}", self.page),
        );
        self.layer = self.doc.get_page(page).get_layer(layer);
        self.y = PAGE_HEIGHT - MARGIN_TOP;
        self.draw_footer();
    }

    fn text(&mut self, text: &str, size: f32, bold: bool, color: (u8, u8, u8)) {
        let line_height = size * 0.5;
        self.ensure_space(line_height);
        let font = if bold { &self.font_bold } else { &self.font };
        self.layer.set_fill_color(rgb(color));
        self.layer
            .use_text(text, size, Mm(MARGIN_LEFT), Mm(self.y), font);
        self.y -= line_height;
    }

    fn paragraph(&mut self, text: &str) {
        for line in wrap(text, WRAP_CHARS) {
            self.text(&line, 10.0, false, COLOR_BLACK);
        }
    }

    fn gap(&mut self, mm: f32) {
        self.y -= mm;
    }

    fn rule(&mut self) {
        self.ensure_space(4.0);
        self.layer.set_outline_color(rgb(COLOR_RULE));
        self.layer.set_outline_thickness(0.5);
        self.layer.add_line(Line {
            points: vec![
                (Point::new(Mm(MARGIN_LEFT), Mm(self.y)), false),
                (Point::new(Mm(PAGE_WIDTH - MARGIN_LEFT), Mm(self.y)), false),
            ],
            is_closed: false,
        });
        self.y -= 4.0;
    }

    fn section(&mut self, title: &str) {
        self.gap(3.0);
        // Keep a heading together with at least its first entry.
        self.ensure_space(16.0);
        self.text(title, 13.0, true, COLOR_TITLE);
        self.gap(1.0);
    }

    fn finish(self) -> AppResult<Vec<u8>> {
        self.doc
            .save_to_bytes()
            .map_err(|e| AppError::Pdf(e.to_string()))
    }
}

/// Render the report. Sections without entries are left out.
pub fn render(report: &PetReport, generated_at: NaiveDateTime) -> AppResult<Vec<u8>> {
    let pet = &report.pet;
    let mut w = Writer::new(&format!("{} - {}", pet.name, i18n::t("app.name")))?;

    w.text(&pet.name, 22.0, true, COLOR_TITLE);
    w.gap(2.0);
    let subtitle = match pet.breed.as_deref().filter(|b| !b.is_empty()) {
        Some(breed) => format!("{} / {}", pet.species, breed),
        None => pet.species.clone(),
    };
    w.text(&subtitle, 12.0, false, COLOR_MUTED);

    if report.range.is_filtered() {
        let bound = |d: Option<chrono::NaiveDate>| d.map(|d| d.to_string()).unwrap_or_else(|| "...".into());
        w.text(
            &format!(
                "Period: {} - {}",
                bound(report.range.start_date),
                bound(report.range.end_date)
            ),
            10.0,
            false,
            COLOR_BLACK,
        );
    }
    w.text(
        &format!("Generated: {} UTC", fmt_time(&generated_at)),
        9.0,
        false,
        COLOR_MUTED,
    );
    w.rule();

    w.section("Details");
    if let Some(birth) = pet.birth_date {
        w.paragraph(&format!("Birth date: {}", birth));
    }
    w.paragraph(&format!("Gender: {}", pet.gender));
    if let Some(notes) = pet.notes.as_deref().filter(|n| !n.is_empty()) {
        w.paragraph(&format!("Notes: {}", notes));
    }

    if !report.walks.is_empty() {
        w.section(&format!("Walks ({})", report.walks.len()));
        for walk in &report.walks {
            let mut line = fmt_time(&walk.walked_at);
            if let Some(minutes) = walk.duration_minutes {
                line.push_str(&format!("  {} min", minutes));
            }
            if let Some(km) = walk.distance_km {
                line.push_str(&format!("  {:.1} km", km));
            }
            if let Some(notes) = walk.notes.as_deref().filter(|n| !n.is_empty()) {
                line.push_str(&format!("  - {}", notes));
            }
            w.paragraph(&line);
        }
    }

    if !report.meals.is_empty() {
        w.section(&format!("Meals ({})", report.meals.len()));
        for meal in &report.meals {
            let mut line = fmt_time(&meal.fed_at);
            if let Some(food) = meal.food_type.as_deref().filter(|f| !f.is_empty()) {
                line.push_str(&format!("  {}", food));
            }
            if let Some(grams) = meal.amount_grams {
                line.push_str(&format!("  {} g", grams));
            } else if let Some(amount) = meal.amount.as_deref().filter(|a| !a.is_empty()) {
                line.push_str(&format!("  {}", amount));
            }
            if let Some(kcal) = meal.calories {
                line.push_str(&format!("  {:.1} kcal", kcal));
            }
            if let Some(notes) = meal.notes.as_deref().filter(|n| !n.is_empty()) {
                line.push_str(&format!("  - {}", notes));
            }
            w.paragraph(&line);
        }
    }

    if !report.traits.is_empty() {
        w.section("Traits");
        for t in &report.traits {
            w.paragraph(&format!("{}: {}", t.trait_name, t.trait_value));
        }
    }

    if !report.meta.is_empty() {
        w.section("Custom fields");
        for m in &report.meta {
            w.paragraph(&format!("{}: {}", m.meta_key, m.meta_value));
        }
    }

    w.finish()
}

pub struct PdfExportService;

impl PdfExportService {
    /// Returns the suggested file name and the PDF bytes.
    pub async fn export(
        state: &Arc<AppState>,
        user: &User,
        pet_id: &str,
        range: DateRange,
    ) -> AppResult<(String, Vec<u8>)> {
        let pet = AccessService::require_pet_role(state, user, pet_id, Role::FamilyMember).await?;

        let report = PetReport {
            walks: WalkRepository::list(&state.db, &pet.id, &range, None).await?,
            meals: MealRepository::list(&state.db, &pet.id, &range, None).await?,
            traits: PetTraitRepository::list(&state.db, &pet.id).await?,
            meta: PetMetaRepository::list(&state.db, &pet.id).await?,
            range,
            pet,
        };

        let bytes = render(&report, state.clock.now().naive_utc())?;
        tracing::info!(
            "User {} exported pet {} ({} bytes)",
            user.id,
            report.pet.id,
            bytes.len()
        );
        Ok((format!("{}-records.pdf", report.pet.name), bytes))
    }
}
