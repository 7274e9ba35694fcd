//! Lays out a small settings form and prints the resulting draw commands.
//!
//! Run with `RUST_LOG=debug` to see tree changes as they happen.

use blueberry_ui::{
    Color, Container, DebugLines, Drawable, DrawCommand, ElementId, HorizontalGroup, Stage, Table,
    UiResult,
};

fn label(stage: &mut Stage, width: f32) -> ElementId {
    let label = stage.create_element();
    // A text renderer would measure this; a fixed size stands in for it
    let _ = stage.set_size(label, width, 16.0);
    label
}

fn main() -> UiResult<()> {
    env_logger::init();

    let mut stage = Stage::new(320.0, 200.0);
    let form = stage.create_widget(Table::default().with_background(Drawable::new(Color::srgba(
        40, 44, 52, 255,
    ))));
    if let Some(element) = stage.element_mut(form) {
        element.set_fill_parent(true);
    }
    stage.add_element(stage.root(), form)?;

    let name = label(&mut stage, 60.0);
    let name_field = stage.create_widget(
        Container::new().with_background(Drawable::new(Color::WHITE).with_padding(2.0)),
    );
    let volume = label(&mut stage, 80.0);

    let mut buttons = HorizontalGroup::new();
    buttons.space(8.0).right();
    let buttons = stage.create_widget(buttons);
    for _ in 0..2 {
        let mut button = Container::new().with_background(Drawable::new(Color::BLACK));
        button.pref_size(64.0, 24.0);
        let button = stage.create_widget(button);
        stage.add_element(buttons, button)?;
    }

    stage.with_widget::<Table, _>(form, |table, stage| -> UiResult<()> {
        table.pad(12.0)?;
        table.set_debug_lines(stage, DebugLines::all())?;
        table.defaults().space(4.0)?;
        table.add(stage, Some(name))?.right();
        table.add(stage, Some(name_field))?.expand_x().fill_x().height(20.0);
        table.row();
        table.add(stage, Some(volume))?.right();
        table.add(stage, None)?;
        table.row();
        table.add(stage, Some(buttons))?.colspan(2)?.expand().fill_x().bottom();
        Ok(())
    })??;

    let out = stage.draw()?;
    for (rect, color) in out.fills() {
        println!("fill    {rect:?} {color:?}");
    }
    for (rect, color) in out.outlines() {
        println!("outline {rect:?} {color:?}");
    }
    let clips = out
        .commands
        .iter()
        .filter(|c| matches!(c, DrawCommand::PushClip(_)))
        .count();
    println!("{clips} clip regions");
    Ok(())
}
