use anyhow::Result;
use calloop::LoopHandle;
use std::fmt;
use std::time::Duration;

use crate::config::ViewConfig;
use crate::presenter::ClockPresenter;
use crate::zones::{ZoneDescriptor, ZoneRegistry, ALL_VIEW};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewSelection {
    All,
    Zone(String),
}

impl fmt::Display for ViewSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ViewSelection::All => f.write_str(ALL_VIEW),
            ViewSelection::Zone(id) => f.write_str(id),
        }
    }
}

/// One selector button.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewOption {
    pub selection: ViewSelection,
    pub icon: String,
    pub label: String,
}

/// Holds the active view and the presenters it implies.
pub struct ViewController {
    registry: ZoneRegistry,
    labels: ViewConfig,
    period: Duration,
    selection: ViewSelection,
    presenters: Vec<ClockPresenter>,
}

impl ViewController {
    /// Start on the "all" view with one presenter per registered zone.
    pub fn new<D: 'static>(
        registry: ZoneRegistry,
        labels: ViewConfig,
        period: Duration,
        handle: &LoopHandle<'static, D>,
    ) -> Result<Self> {
        let mut controller = Self {
            registry,
            labels,
            period,
            selection: ViewSelection::All,
            presenters: Vec::new(),
        };
        controller.presenters = controller.spawn_presenters(&ViewSelection::All, handle)?;
        Ok(controller)
    }

    pub fn registry(&self) -> &ZoneRegistry {
        &self.registry
    }

    pub fn selection(&self) -> &ViewSelection {
        &self.selection
    }

    pub fn presenters(&self) -> &[ClockPresenter] {
        &self.presenters
    }

    /// Zones shown for the current selection, in registration order.
    pub fn active_zones(&self) -> Vec<&ZoneDescriptor> {
        self.zones_for(&self.selection)
    }

    pub fn view_options(&self) -> Vec<ViewOption> {
        let mut options: Vec<ViewOption> = self
            .registry
            .all_zones()
            .iter()
            .map(|z| ViewOption {
                selection: ViewSelection::Zone(z.id.clone()),
                icon: z.icon.clone(),
                label: z.city.clone(),
            })
            .collect();
        options.push(ViewOption {
            selection: ViewSelection::All,
            icon: self.labels.all_icon.clone(),
            label: self.labels.all_label.clone(),
        });
        options
    }

    /// Switch views. Every presenter of the old view is dropped (cancelling its
    /// timer) and the new view starts from fresh snapshots. Returns whether
    /// the selection changed.
    pub fn select<D: 'static>(&mut self, selection: ViewSelection, handle: &LoopHandle<'static, D>) -> Result<bool> {
        if let ViewSelection::Zone(id) = &selection {
            self.registry.lookup(id)?;
        }
        if selection == self.selection {
            return Ok(false);
        }

        let presenters = self.spawn_presenters(&selection, handle)?;
        log::info!("View changed: {} -> {}", self.selection, selection);
        self.presenters = presenters;
        self.selection = selection;
        Ok(true)
    }

    /// Report and clear whether any visible card changed.
    pub fn take_dirty(&self) -> bool {
        self.presenters
            .iter()
            .fold(false, |dirty, p| p.take_dirty() || dirty)
    }

    fn zones_for(&self, selection: &ViewSelection) -> Vec<&ZoneDescriptor> {
        match selection {
            ViewSelection::All => self.registry.all_zones().iter().collect(),
            ViewSelection::Zone(id) => self.registry.lookup(id).into_iter().collect(),
        }
    }

    fn spawn_presenters<D: 'static>(
        &self,
        selection: &ViewSelection,
        handle: &LoopHandle<'static, D>,
    ) -> Result<Vec<ClockPresenter>> {
        self.zones_for(selection)
            .into_iter()
            .map(|zone| ClockPresenter::activate(zone.clone(), self.period, handle))
            .collect()
    }
}
