//! Writing partitioned point clouds for visualization.

use std::path::Path;

use vtkio::model::{
    Attribute, Attributes, ByteOrder, CellType, Cells, DataSet, IOBuffer, UnstructuredGridPiece,
    Version, VertexNumbers, Vtk,
};

use crate::geometry::Point;
use crate::types::{PartitionId, RcbError};

/// Write `points` as a legacy-VTK unstructured grid of vertex cells with
/// the partition id attached as point data, so a partition can be colored
/// in a viewer.
pub fn write_partitioned_points(
    path: impl AsRef<Path>,
    points: &[Point],
    part_ids: &[PartitionId],
) -> Result<(), RcbError> {
    if points.len() != part_ids.len() {
        return Err(RcbError::PointWriter(format!(
            "{} points but {} partition ids",
            points.len(),
            part_ids.len()
        )));
    }

    let num_points = points.len();
    let coords: Vec<f64> = points.iter().flat_map(|point| point.coords()).collect();

    // One vertex cell per point.
    let mut vertices = Vec::with_capacity(2 * num_points);
    for index in 0..num_points {
        vertices.push(1u32);
        vertices.push(index as u32);
    }

    let vtk = Vtk {
        version: Version { major: 2, minor: 0 },
        title: String::from("partitioned points"),
        byte_order: ByteOrder::BigEndian,
        file_path: None,
        data: DataSet::inline(UnstructuredGridPiece {
            points: IOBuffer::F64(coords),
            cells: Cells {
                cell_verts: VertexNumbers::Legacy {
                    num_cells: num_points as u32,
                    vertices,
                },
                types: vec![CellType::Vertex; num_points],
            },
            data: Attributes {
                point: vec![Attribute::scalars("partition", 1)
                    .with_data(part_ids.iter().map(|&id| id as f64).collect::<Vec<f64>>())],
                cell: vec![],
            },
        }),
    };

    vtk.export_ascii(path.as_ref())
        .map_err(|error| RcbError::PointWriter(format!("{error:?}")))
}

#[cfg(test)]
mod test {
    use super::write_partitioned_points;
    use crate::geometry::Point;
    use crate::types::RcbError;

    #[test]
    fn writes_a_nonempty_file() {
        let points = vec![
            Point::new([0.0, 0.0, 0.0]),
            Point::new([1.0, 0.0, 0.0]),
            Point::new([0.0, 1.0, 0.0]),
        ];
        let path = std::env::temp_dir().join("rcb_partition_writer_test.vtk");
        write_partitioned_points(&path, &points, &[0, 1, 1]).unwrap();
        let written = std::fs::metadata(&path).unwrap().len();
        assert!(written > 0);
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn mismatched_ids_are_an_error() {
        let points = vec![Point::new([0.0, 0.0, 0.0])];
        let result = write_partitioned_points("unused.vtk", &points, &[0, 1]);
        assert!(matches!(result, Err(RcbError::PointWriter(_))));
    }
}
