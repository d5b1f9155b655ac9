use fevtk::source::from_iter;
use fevtk::{
    export_collection, read_pvd, read_vtu, with_collection, Ascii, Binary, CollectionWriter,
    Error, Layout, Model, ModelBuilder, Placement, UsageError, VtkWriter, WriterOptions,
};

use std::path::Path;

fn bar(part: &str, time: f64) -> Model {
    let mut model = ModelBuilder::new("bar")
        .part(part)
        .time(time)
        .node(1, [0.0, 0.0, 0.0])
        .node(2, [1.0, 0.0, 0.0])
        .node(3, [2.0, 0.0, 0.0])
        .element(1, "line2", [1, 2])
        .element(2, "line2", [2, 3])
        .build()
        .unwrap();

    model
        .add_field(
            "U",
            Placement::Nodes,
            [(1, [0.0]), (2, [time]), (3, [2.0 * time])],
            Layout::Scalar,
        )
        .unwrap();

    model
}

fn writer(dir: &Path) -> VtkWriter<Ascii> {
    VtkWriter::new(Ascii, WriterOptions::new(dir))
}

#[test]
fn three_increments_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let manifest = dir.path().join("bar.pvd");

    {
        let mut collection = CollectionWriter::new(writer(dir.path()), &manifest).unwrap();
        for time in [0.0, 0.1, 0.2] {
            collection.write(&bar("P", time)).unwrap();
        }
        assert_eq!(collection.entries().len(), 3);
        // manifest is written when the collection goes out of scope
        assert!(!manifest.exists());
    }

    let entries = read_pvd(&manifest).unwrap();
    let timesteps: Vec<f64> = entries.iter().map(|e| e.timestep).collect();
    assert_eq!(timesteps, [0.0, 0.1, 0.2]);

    for (frame, entry) in entries.iter().enumerate() {
        assert_eq!(entry.group, "P");
        assert_eq!(entry.part, 0);
        assert_eq!(entry.file, format!("bar/ascii/P_0_{frame}.vtu"));

        let piece = read_vtu(dir.path().join(&entry.file)).unwrap();
        assert_eq!(piece.time, Some(entry.timestep));
    }
}

#[test]
fn no_writes_give_an_empty_manifest() {
    let dir = tempfile::tempdir().unwrap();
    let manifest = dir.path().join("empty.pvd");

    let collection = CollectionWriter::new(writer(dir.path()), &manifest).unwrap();
    let path = collection.finish().unwrap();

    assert_eq!(path, manifest);
    assert!(read_pvd(&manifest).unwrap().is_empty());
}

#[test]
fn manifests_cannot_be_reused() {
    let dir = tempfile::tempdir().unwrap();
    let manifest = dir.path().join("once.pvd");

    let first = CollectionWriter::new(writer(dir.path()), &manifest).unwrap();
    match CollectionWriter::new(writer(dir.path()), &manifest) {
        Err(Error::Usage(UsageError::ManifestInUse(_))) => (),
        other => panic!("expected the manifest to be in use, got {other:?}"),
    }

    first.finish().unwrap();
    match CollectionWriter::new(writer(dir.path()), &manifest) {
        Err(Error::Usage(UsageError::ManifestClosed(_))) => (),
        other => panic!("expected the manifest to be closed, got {other:?}"),
    }
}

#[test]
fn aliases_of_an_open_manifest_are_in_use() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir(dir.path().join("sub")).unwrap();
    let manifest = dir.path().join("alias.pvd");

    let first = CollectionWriter::new(writer(dir.path()), &manifest).unwrap();
    let alias = dir.path().join("sub").join("..").join("alias.pvd");
    match CollectionWriter::new(writer(dir.path()), &alias) {
        Err(Error::Usage(UsageError::ManifestInUse(path))) => assert_eq!(path, manifest),
        other => panic!("expected the manifest to be in use, got {other:?}"),
    }

    first.finish().unwrap();
    let dotted = dir.path().join(".").join("alias.pvd");
    assert!(matches!(
        CollectionWriter::new(writer(dir.path()), dotted),
        Err(Error::Usage(UsageError::ManifestClosed(_)))
    ));
}

#[test]
fn piece_counts_are_fixed_per_part() {
    let dir = tempfile::tempdir().unwrap();
    let manifest = dir.path().join("pieces.pvd");
    let mut collection = CollectionWriter::new(writer(dir.path()), &manifest).unwrap();

    collection.write_pieces(&bar("P", 0.0), 2).unwrap();
    collection.write_pieces(&bar("Q", 0.0), 1).unwrap();

    let err = collection.write_pieces(&bar("P", 1.0), 1).unwrap_err();
    assert!(matches!(
        err,
        Error::Usage(UsageError::PieceCountChanged {
            previous: 2,
            requested: 1,
            ..
        })
    ));

    collection.write_pieces(&bar("P", 1.0), 2).unwrap();
    collection.finish().unwrap();

    let entries = read_pvd(&manifest).unwrap();
    let parts: Vec<(usize, &str)> = entries.iter().map(|e| (e.part, e.group.as_str())).collect();
    assert_eq!(
        parts,
        [(0, "P"), (1, "P"), (2, "Q"), (0, "P"), (1, "P")]
    );
    assert_eq!(entries[4].file, "bar/ascii/P_1_1.vtu");
}

#[test]
fn manifest_is_written_when_the_body_fails() {
    let dir = tempfile::tempdir().unwrap();
    let manifest = dir.path().join("partial.pvd");

    let result: Result<(), Error> = with_collection(writer(dir.path()), &manifest, |collection| {
        collection.write(&bar("P", 0.0))?;
        collection.write_pieces(&bar("Z", 1.0), 0)?;
        Ok(())
    });

    assert!(matches!(result, Err(Error::Usage(UsageError::ZeroPieces))));
    assert_eq!(read_pvd(&manifest).unwrap().len(), 1);
}

#[test]
fn manifest_is_written_on_unwind() {
    let dir = tempfile::tempdir().unwrap();
    let manifest = dir.path().join("panic.pvd");

    let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        let mut collection = CollectionWriter::new(writer(dir.path()), &manifest).unwrap();
        collection.write(&bar("P", 0.0)).unwrap();
        panic!("solver reader failed");
    }));

    assert!(outcome.is_err());
    assert_eq!(read_pvd(&manifest).unwrap().len(), 1);
}

#[test]
fn sources_are_exported_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let manifest = dir.path().join("source.pvd");
    let models = (0..4).map(|step| Ok(bar("P", step as f64)));

    let mut collection = CollectionWriter::new(
        VtkWriter::new(Binary, WriterOptions::new(dir.path())),
        &manifest,
    )
    .unwrap();
    let outputs = export_collection(from_iter(models), &mut collection).unwrap();
    collection.finish().unwrap();

    let frames: Vec<u64> = outputs.iter().map(|o| o.frame).collect();
    assert_eq!(frames, [0, 1, 2, 3]);

    let entries = read_pvd(&manifest).unwrap();
    assert_eq!(entries.len(), 4);
    assert_eq!(entries[3].file, "bar/binary/P_0_3.vtu");
    assert_eq!(entries[3].timestep, 3.0);
}
