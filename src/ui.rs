use ratatui::{
    layout::{Constraint, Direction, Layout},
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};
use crate::data::Platform;
use crate::layer::{LayerStats, MapPoint, ProvinceFilter};
use crate::projection::miller_inverse;
use crate::state::AppState;

const FORMULA: &str = "V = (Followers / Residenti + Frequenza_Post / max_frequenza_post) / 2";

fn format_score(score: Option<f64>) -> String {
    score.map_or_else(|| "b.d.".to_string(), |s| format!("{:.3}", s))
}

fn format_residents(value: Option<f64>) -> String {
    value.map_or_else(|| "b.d.".to_string(), |v| format!("{:.0}", v))
}

pub fn draw(f: &mut Frame<'_>, state: &mut AppState) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(0)].as_ref())
        .split(f.area());

    // Pasek serwisów
    let tabs: Vec<Span> = Platform::ALL
        .iter()
        .enumerate()
        .flat_map(|(i, p)| {
            let (r, g, b) = p.brand_rgb();
            let style = if *p == state.view.platform {
                Style::default().fg(Color::Black).bg(Color::Rgb(r, g, b))
            } else {
                Style::default().fg(Color::Rgb(r, g, b))
            };
            [Span::styled(format!(" {} {} ", i + 1, p.label()), style), Span::raw(" ")]
        })
        .chain([Span::raw(match state.layer.filter {
            ProvinceFilter::All => "| wszystkie gminy",
            ProvinceFilter::ProvincesOnly => "| tylko stolice prowincji",
        })])
        .collect();
    f.render_widget(Paragraph::new(Line::from(tabs)), rows[0]);

    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(20),
            Constraint::Percentage(55),
            Constraint::Percentage(25),
        ].as_ref())
        .split(rows[1]);

    // Lewy panel: gminy
    let items: Vec<ListItem> = state.layer.points
        .iter()
        .map(|p| {
            let swatch = Span::styled("● ", Style::default().fg(p.color.to_terminal()));
            ListItem::new(Line::from(vec![
                swatch,
                Span::raw(format!("{} ({})", p.name, format_score(p.score))),
            ]))
        })
        .collect();
    let mut list_state = ListState::default();
    list_state.select(Some(state.selected));
    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title("Gminy"))
        .highlight_symbol(">> ")
        .highlight_style(Style::default().fg(Color::Red));
    f.render_stateful_widget(list, chunks[0], &mut list_state);

    // Środek: mapa
    state.map_area = chunks[1];
    let (lon, lat) = miller_inverse(state.viewport.center());
    let title = format!("Mapa – {} ({:.2}°N {:.2}°E)", state.view.platform, lat, lon);
    let highlight = state.selected_point().map(|_| state.selected);
    state.map.render(f, chunks[1], &title, state.viewport, &state.layer, highlight);

    // Prawy panel: gmina + statystyki + notatki
    let notes_height = if state.show_notes {
        Constraint::Percentage(35)
    } else {
        Constraint::Length(3)
    };
    let right_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(35), Constraint::Percentage(30), notes_height].as_ref())
        .split(chunks[2]);

    // — Informacje
    let info_text = match state.selected_point() {
        Some(p) => point_info(p),
        None => state.info.clone(),
    };
    let info_paragraph = Paragraph::new(info_text)
        .block(Block::default().borders(Borders::ALL).title("Informacje"))
        .wrap(Wrap { trim: true });
    f.render_widget(info_paragraph, right_chunks[0]);

    // — Statystyki
    let stats_paragraph = Paragraph::new(stats_text(&state.layer.stats()))
        .block(Block::default().borders(Borders::ALL).title("Statystyki"))
        .style(Style::default().fg(Color::White))
        .wrap(Wrap { trim: true });
    f.render_widget(stats_paragraph, right_chunks[1]);

    // — Notatki
    let notes = if state.show_notes {
        format!("{}\n\n{}\n\n{}", FORMULA, state.info, AppState::HELP_TEXT)
    } else {
        "n: pokaż wzór i pomoc".to_string()
    };
    let notes_paragraph = Paragraph::new(notes)
        .block(Block::default().borders(Borders::ALL).title("Notatki"))
        .style(Style::default().fg(Color::White))
        .wrap(Wrap { trim: true });
    f.render_widget(notes_paragraph, right_chunks[2]);
}

fn point_info(p: &MapPoint) -> String {
    format!(
        "{}\nKod: {}\nMieszkańcy: {}\nWskaźnik: {}\nKolor: {}",
        p.name,
        p.id,
        format_residents(p.value),
        format_score(p.score),
        p.color
    )
}

fn stats_text(stats: &LayerStats) -> String {
    let best = stats
        .best
        .as_ref()
        .map_or_else(|| "b.d.".to_string(), |(name, s)| format!("{} ({:.3})", name, s));
    format!(
        "Gminy: {}\nZ danymi: {}\nŚredni wskaźnik: {}\nNajwyższy: {}\nMieszkańcy razem: {:.0}",
        stats.points,
        stats.with_data,
        format_score(stats.mean_score),
        best,
        stats.residents
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ViewConfig;
    use crossterm::event::KeyCode;
    use ratatui::{backend::TestBackend, Terminal};
    use rstest::rstest;

    fn screen(state: &mut AppState) -> String {
        let mut terminal = Terminal::new(TestBackend::new(160, 48)).expect("terminal");
        terminal.draw(|f| draw(f, state)).expect("draw");
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect()
    }

    #[rstest]
    fn draws_all_panels() {
        let mut state = AppState::new(ViewConfig::default()).expect("state");

        let text = screen(&mut state);

        assert!(text.contains("Gminy"));
        assert!(text.contains("Mapa"));
        assert!(text.contains("Statystyki"));
        assert!(text.contains("Palermo"));
        assert_ne!(state.map_area.width, 0);
    }

    #[rstest]
    fn notes_show_the_formula() {
        let mut state = AppState::new(ViewConfig::default()).expect("state");
        state.handle_input(KeyCode::Char('n'));

        let text = screen(&mut state);

        assert!(text.contains("Followers"));
    }

    #[rstest]
    fn info_panel_reports_missing_score() {
        let mut state = AppState::new(ViewConfig::default()).expect("state");
        let corleone = state
            .layer
            .points
            .iter()
            .position(|p| p.name == "Corleone")
            .expect("Corleone");
        state.selected = corleone;

        let info = point_info(state.selected_point().expect("point"));

        assert!(info.contains("Wskaźnik: b.d."));
        assert!(info.contains("rgb(255, 255, 255)"));
    }
}
