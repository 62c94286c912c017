use bevy::prelude::*;
use bevy_egui::{EguiContexts, egui};
use lab_render::ControlLock;

use crate::sim::SimReady;

const CONTROLS: [(&str, &str); 9] = [
    ("W A S D", "move"),
    ("Shift", "sprint"),
    ("Space", "jump / ascend"),
    ("Q", "descend (ghost)"),
    ("G", "ghost mode"),
    ("E", "interact"),
    ("T", "debug overlay"),
    ("Mouse", "look"),
    ("Esc", "release pointer"),
];

/// Click-to-start panel while the pointer is free, a small controls card
/// while it is captured.
pub fn instructions_overlay_system(
    mut contexts: EguiContexts,
    lock: Res<ControlLock>,
    sim_ready: Res<SimReady>,
) {
    let Ok(ctx) = contexts.ctx_mut() else {
        return;
    };

    if lock.locked {
        egui::Area::new(egui::Id::new("controls_help"))
            .anchor(egui::Align2::RIGHT_BOTTOM, [-12.0, -12.0])
            .interactable(false)
            .show(ctx, |ui| {
                egui::Frame::popup(ui.style()).show(ui, |ui| {
                    ui.small("E interact  ·  G ghost  ·  T debug  ·  Esc release");
                });
            });
        return;
    }

    egui::Area::new(egui::Id::new("instructions"))
        .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
        .show(ctx, |ui| {
            egui::Frame::popup(ui.style()).show(ui, |ui| {
                if sim_ready.0 {
                    ui.heading("Click to explore the lab");
                } else {
                    ui.heading("Loading lab...");
                }
                ui.separator();
                egui::Grid::new("controls").striped(true).show(ui, |ui| {
                    for (keys, action) in CONTROLS {
                        ui.strong(keys);
                        ui.label(action);
                        ui.end_row();
                    }
                });
            });
        });
}
