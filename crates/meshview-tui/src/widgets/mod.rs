pub mod graph_canvas;
pub mod keyed_table;
pub mod legend;
pub mod status_indicator;
