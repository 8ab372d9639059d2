use serde::Serialize;

use crate::network::{Link, Snapshot};

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Cell {
    pub row: usize,
    pub col: usize,
    pub value: f64,
    pub value_up: f64,
    pub value_down: f64,
    pub highlight: i64,
    pub info: Option<String>,
}

impl Cell {
    fn empty(row: usize, col: usize) -> Self {
        Self {
            row,
            col,
            ..Self::default()
        }
    }

    pub fn is_zero(&self) -> bool {
        self.value == 0.0 && self.value_up == 0.0 && self.value_down == 0.0
    }
}

/// Dense row-major grid over the sparse link list.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MatrixIndex {
    grid: Vec<Vec<Cell>>,
}

impl MatrixIndex {
    pub fn build(row_count: usize, col_count: usize, links: &[Link]) -> Self {
        let mut grid = (0..row_count)
            .map(|row| (0..col_count).map(|col| Cell::empty(row, col)).collect::<Vec<_>>())
            .collect::<Vec<_>>();

        for link in links {
            let Some(cell) = grid
                .get_mut(link.source)
                .and_then(|row| row.get_mut(link.target))
            else {
                continue;
            };
            cell.value = link.value;
            cell.value_up = link.value_up.unwrap_or(0.0);
            cell.value_down = link.value_down.unwrap_or(0.0);
            cell.highlight = link.highlight.unwrap_or(0);
            cell.info = link.info.clone();
        }

        Self { grid }
    }

    pub fn from_snapshot(snapshot: &Snapshot) -> Self {
        Self::build(
            snapshot.row_nodes.len(),
            snapshot.col_nodes.len(),
            &snapshot.links,
        )
    }

    pub fn row_count(&self) -> usize {
        self.grid.len()
    }

    pub fn col_count(&self) -> usize {
        self.grid.first().map_or(0, Vec::len)
    }

    pub fn get(&self, row: usize, col: usize) -> Option<&Cell> {
        self.grid.get(row).and_then(|cells| cells.get(col))
    }

    pub fn row(&self, row: usize) -> &[Cell] {
        self.grid.get(row).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn row_values(&self, row: usize) -> Vec<f64> {
        self.row(row).iter().map(|cell| cell.value).collect()
    }

    pub fn col_values(&self, col: usize) -> Vec<f64> {
        self.grid
            .iter()
            .map(|cells| cells.get(col).map_or(0.0, |cell| cell.value))
            .collect()
    }

    /// Cells worth drawing, row-major.
    pub fn nonzero_cells(&self) -> impl Iterator<Item = &Cell> {
        self.grid.iter().flatten().filter(|cell| !cell.is_zero())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn link(source: usize, target: usize, value: f64) -> Link {
        Link {
            source,
            target,
            row_name: format!("r{source}"),
            col_name: format!("c{target}"),
            value,
            value_up: None,
            value_down: None,
            highlight: None,
            info: None,
        }
    }

    #[test]
    fn grid_is_dense_and_overlaid_with_links() {
        let matrix = MatrixIndex::build(3, 2, &[link(0, 1, 2.5), link(2, 0, -1.0)]);

        assert_eq!(matrix.row_count(), 3);
        assert_eq!(matrix.col_count(), 2);
        assert_eq!(matrix.get(0, 1).map(|cell| cell.value), Some(2.5));
        assert_eq!(matrix.get(1, 1).map(|cell| (cell.row, cell.col, cell.value)), Some((1, 1, 0.0)));
        assert_eq!(matrix.col_values(0), vec![0.0, 0.0, -1.0]);
    }

    #[test]
    fn zero_cells_are_filtered_for_rendering_only() {
        let matrix = MatrixIndex::build(2, 2, &[link(1, 1, 4.0)]);

        let drawn = matrix.nonzero_cells().map(|cell| (cell.row, cell.col)).collect::<Vec<_>>();
        assert_eq!(drawn, vec![(1, 1)]);
        assert!(matrix.get(0, 0).is_some());
    }

    #[test]
    fn out_of_range_links_are_ignored() {
        let matrix = MatrixIndex::build(1, 1, &[link(3, 0, 1.0)]);

        assert_eq!(matrix.nonzero_cells().count(), 0);
    }
}
