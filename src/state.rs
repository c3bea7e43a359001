use crossterm::event::{KeyCode, MouseButton, MouseEvent, MouseEventKind};
use ratatui::layout::Rect;

use crate::{
    config::ViewConfig,
    data::{Datasets, Platform},
    error::{DataError, MapError},
    layer::{MapLayer, MapPoint},
    map_draw::{MapView, Viewport},
    score::EngagementScorer,
};

#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error(transparent)]
    Data(#[from] DataError),
    #[error(transparent)]
    Map(#[from] MapError),
}

/// Najstarsze kroki przybliżenia są zapominane
const MAX_ZOOM_HISTORY: usize = 32;

pub struct AppState {
    data: Datasets,
    pub map: MapView,
    pub view: ViewConfig,
    pub layer: MapLayer,
    pub selected: usize,
    pub viewport: Viewport,
    pub history: Vec<Viewport>,
    /// Obszar mapy z ostatniego rysowania (do obsługi myszy)
    pub map_area: Rect,
    pub show_notes: bool,
    pub info: String,
}

impl AppState {
    pub const HELP_TEXT: &'static str = "\
1-4 / f i t y: serwis
p: tylko stolice prowincji
↑/↓: wybór gminy, Enter: przybliż
klik: przybliż (gmina lub wyspa)
Esc / Backspace: wstecz, 0: cała mapa
n: notatki, q: wyjście";

    pub fn new(view: ViewConfig) -> Result<Self, StateError> {
        let data = Datasets::load()?;
        let map = MapView::bundled()?;
        let layer = Self::build_layer(&data, view);
        let viewport = map.full_view();
        let info = format!("Sycylia – {} obszarów", map.feature_count());

        Ok(Self {
            data,
            map,
            view,
            layer,
            selected: 0,
            viewport,
            history: Vec::new(),
            map_area: Rect::default(),
            show_notes: false,
            info,
        })
    }

    fn build_layer(data: &Datasets, view: ViewConfig) -> MapLayer {
        let scorer = EngagementScorer::new(&data.frequencies);
        MapLayer::build(data.select(view.platform), &scorer, view)
    }

    /// Buduje warstwę od nowa i zastępuje poprzednią
    fn reload(&mut self) {
        let selected_id = self.selected_point().map(|p| p.id.clone());
        self.layer = Self::build_layer(&self.data, self.view);
        self.selected = selected_id
            .and_then(|id| self.layer.points.iter().position(|p| p.id == id))
            .unwrap_or(0);
    }

    pub fn set_platform(&mut self, platform: Platform) {
        if self.view.platform != platform {
            self.view.platform = platform;
            self.reload();
            self.info = format!("Serwis: {}", platform);
        }
    }

    pub fn toggle_provinces(&mut self) {
        self.view.filter = self.view.filter.toggled();
        self.reload();
        self.info = format!("{} gmin na mapie", self.layer.points.len());
    }

    pub fn selected_point(&self) -> Option<&MapPoint> {
        self.layer.points.get(self.selected)
    }

    fn zoom_to(&mut self, target: Viewport) {
        if target == self.viewport {
            return;
        }
        if self.history.len() == MAX_ZOOM_HISTORY {
            self.history.remove(0);
        }
        self.history.push(self.viewport);
        log::debug!("przybliżenie do {:?}", target);
        self.viewport = target;
    }

    pub fn zoom_back(&mut self) {
        if let Some(prev) = self.history.pop() {
            self.viewport = prev;
        }
    }

    pub fn reset_zoom(&mut self) {
        self.history.clear();
        self.viewport = self.map.full_view();
    }

    pub fn zoom_to_selected(&mut self) {
        let target = self.selected_point().and_then(|p| self.map.zoom_to_point(p));
        match target {
            Some(v) => self.zoom_to(v),
            None => self.info = "Brak współrzędnych dla tej gminy".to_string(),
        }
    }

    /// Zwraca true, jeśli trzeba wyjść
    pub fn handle_input(&mut self, key: KeyCode) -> bool {
        use KeyCode::*;
        match key {
            Char('q') => return true,
            Char('1') | Char('f') => self.set_platform(Platform::Facebook),
            Char('2') | Char('i') => self.set_platform(Platform::Instagram),
            Char('3') | Char('t') => self.set_platform(Platform::Twitter),
            Char('4') | Char('y') => self.set_platform(Platform::YouTube),
            Char('p') => self.toggle_provinces(),
            Char('n') => self.show_notes = !self.show_notes,
            Char('0') => self.reset_zoom(),
            Up => if self.selected > 0 { self.selected -= 1 },
            Down => if self.selected + 1 < self.layer.points.len() { self.selected += 1 },
            Enter => self.zoom_to_selected(),
            Backspace | Esc => self.zoom_back(),
            _ => {}
        }
        false
    }

    /// Klik na gminie przybliża do niej, klik na wyspie do całej wyspy
    pub fn handle_mouse(&mut self, event: MouseEvent) {
        if event.kind != MouseEventKind::Down(MouseButton::Left) {
            return;
        }
        let (column, row) = (event.column, event.row);

        if let Some(i) =
            self.map.marker_at(&self.layer, self.viewport, self.map_area, column, row)
        {
            self.selected = i;
            self.zoom_to_selected();
            return;
        }

        let Some(at) = self.map.map_coord(self.viewport, self.map_area, column, row) else {
            return;
        };
        let target = self.map.region_at(at).map(|r| (r.name.clone(), self.map.zoom_to_region(r)));
        if let Some((name, target)) = target {
            self.zoom_to(target);
            self.info = name;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layer::{PROVINCES, ProvinceFilter};
    use crate::projection::miller;
    use crossterm::event::KeyModifiers;
    use rstest::{fixture, rstest};

    #[fixture]
    fn state() -> AppState {
        let mut state = AppState::new(ViewConfig::default()).expect("state");
        state.map_area = Rect::new(0, 0, 82, 42);
        state
    }

    fn click(column: u16, row: u16) -> MouseEvent {
        MouseEvent {
            kind: MouseEventKind::Down(MouseButton::Left),
            column,
            row,
            modifiers: KeyModifiers::NONE,
        }
    }

    /// Komórka ekranu nad danym punktem (odwrotność `Viewport::to_map`)
    fn cell_of(state: &AppState, lon: f64, lat: f64) -> (u16, u16) {
        let inner = Rect::new(
            state.map_area.x + 1,
            state.map_area.y + 1,
            state.map_area.width - 2,
            state.map_area.height - 2,
        );
        let view = state.viewport.fitted(inner);
        let c = miller(lon, lat);
        let fx = (c.x - view.x[0]) / view.width();
        let fy = (view.y[1] - c.y) / view.height();
        (
            inner.x + (fx * f64::from(inner.width)) as u16,
            inner.y + (fy * f64::from(inner.height)) as u16,
        )
    }

    #[rstest]
    fn switches_platform_and_replaces_layer(mut state: AppState) {
        assert_eq!(state.layer.platform, Platform::Facebook);

        assert!(!state.handle_input(KeyCode::Char('4')));

        assert_eq!(state.view.platform, Platform::YouTube);
        assert_eq!(state.layer.platform, Platform::YouTube);
    }

    #[rstest]
    fn province_toggle_filters_and_keeps_selection(mut state: AppState) {
        let all = state.layer.points.len();
        let palermo = state
            .layer
            .points
            .iter()
            .position(|p| p.name == "Palermo")
            .expect("Palermo");
        state.selected = palermo;

        state.handle_input(KeyCode::Char('p'));

        assert_eq!(state.view.filter, ProvinceFilter::ProvincesOnly);
        assert!(state.layer.points.len() < all);
        assert!(state.layer.points.iter().all(|p| PROVINCES.contains(&p.name.as_str())));
        assert_eq!(state.selected_point().map(|p| p.name.as_str()), Some("Palermo"));

        state.handle_input(KeyCode::Char('p'));
        assert_eq!(state.layer.points.len(), all);
    }

    #[rstest]
    fn navigation_stays_in_bounds(mut state: AppState) {
        state.handle_input(KeyCode::Up);
        assert_eq!(state.selected, 0);

        for _ in 0..100 {
            state.handle_input(KeyCode::Down);
        }
        assert_eq!(state.selected, state.layer.points.len() - 1);
    }

    #[rstest]
    fn enter_zooms_and_escape_goes_back(mut state: AppState) {
        let full = state.viewport;

        state.handle_input(KeyCode::Enter);
        assert_ne!(state.viewport, full);
        assert_eq!(state.history.len(), 1);

        state.handle_input(KeyCode::Esc);
        assert_eq!(state.viewport, full);
        assert!(state.history.is_empty());
    }

    #[rstest]
    fn click_on_marker_selects_and_zooms(mut state: AppState) {
        let target = state
            .layer
            .points
            .iter()
            .position(|p| p.name == "Enna")
            .expect("Enna");
        let (lon, lat) = state.layer.points[target].position().expect("position");
        let (column, row) = cell_of(&state, lon, lat);

        state.handle_mouse(click(column, row));

        assert_eq!(state.selected, target);
        assert_eq!(state.history.len(), 1);
    }

    #[rstest]
    fn click_on_island_zooms_to_it(mut state: AppState) {
        let (column, row) = cell_of(&state, 11.97, 36.78);

        state.handle_mouse(click(column, row));

        assert_eq!(state.info, "Pantelleria");
        assert_eq!(state.history.len(), 1);
    }

    #[rstest]
    fn repeated_zoom_to_current_view_does_not_grow_history(mut state: AppState) {
        let (column, row) = cell_of(&state, 11.97, 36.78);
        state.handle_mouse(click(column, row));
        let zoomed = state.viewport;

        for _ in 0..5 {
            state.zoom_to(zoomed);
        }

        assert_eq!(state.viewport, zoomed);
        assert_eq!(state.history.len(), 1);
    }

    #[rstest]
    fn zoom_history_is_bounded(mut state: AppState) {
        let full = state.map.full_view();
        for i in 0..(MAX_ZOOM_HISTORY * 2) {
            let c = full.center();
            state.zoom_to(Viewport::around(c, 0.01 + i as f64 * 0.001));
        }

        assert_eq!(state.history.len(), MAX_ZOOM_HISTORY);
    }

    #[rstest]
    fn click_outside_map_is_ignored(mut state: AppState) {
        let before = state.viewport;

        state.handle_mouse(click(200, 200));

        assert_eq!(state.viewport, before);
        assert!(state.history.is_empty());
    }

    #[rstest]
    fn quits_on_q(mut state: AppState) {
        assert!(state.handle_input(KeyCode::Char('q')));
    }
}
