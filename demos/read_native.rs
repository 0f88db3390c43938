use potree_reader::prelude::*;

pub fn main() {
    let dir = std::env::args()
        .nth(1)
        .expect("usage: read_native <cloud directory>");

    let mut cloud = PotreePointCloud::from_dir(&dir).unwrap();

    println!(
        "{}: {} nodes, {} declared points",
        dir,
        cloud.nodes().count(),
        cloud.metadata().points
    );
    for node in cloud.nodes() {
        println!(
            "{:>10} points  {:?}  '{}'",
            node.num_points, node.kind, node.name
        );
    }

    let points = cloud.load("").unwrap();
    println!("root holds {} decoded points", points.len());
    if let Some(point) = points.first() {
        println!("first point: {:?}", point);
    }

    cloud.unload("").unwrap();
}
