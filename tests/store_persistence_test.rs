use anyhow::Result;
use dataroom::{EntryStore, FileSystem, StoreConfig};
use tempfile::tempdir;

#[tokio::test]
async fn test_entries_survive_reopen() -> Result<()> {
    let temp_root = tempdir()?;
    let config = StoreConfig::new(temp_root.path().join("db"));

    let (folder, file) = {
        let fs = FileSystem::open(config.clone()).await?;
        let folder = fs.create_folder(None, "Contracts").await?;
        let file = fs
            .upload_file(Some(&folder.id), "nda.pdf", b"%PDF".to_vec(), "application/pdf")
            .await?;
        (folder, file)
    };

    let store = EntryStore::new(config);
    store.initialize().await?;
    assert_eq!(store.get_by_id(&folder.id).await?, Some(folder.clone()));
    assert_eq!(store.get_by_parent(Some(&folder.id)).await?, vec![file]);
    Ok(())
}

#[tokio::test]
async fn test_folder_tree_and_breadcrumbs() -> Result<()> {
    let fs = FileSystem::new(EntryStore::in_memory());
    let a = fs.create_folder(None, "A").await?;
    let b = fs.create_folder(Some(&a.id), "B").await?;
    let c = fs.create_folder(Some(&b.id), "C").await?;
    let d = fs.create_folder(Some(&c.id), "D").await?;

    let chain = fs.navigator().ancestor_chain(&d.id).await?;
    let ids: Vec<_> = chain.iter().map(|crumb| crumb.id.clone()).collect();
    assert_eq!(ids, vec![a.id.clone(), b.id.clone(), c.id.clone()]);

    let tree = fs.folder_tree().await?;
    assert_eq!(tree.len(), 1);
    assert_eq!(tree[0].children[0].children[0].children[0].id, d.id);
    Ok(())
}

#[tokio::test]
async fn test_clear_empties_everything() -> Result<()> {
    let temp_root = tempdir()?;
    let fs = FileSystem::open(StoreConfig::new(temp_root.path().join("db"))).await?;
    let a = fs.create_folder(None, "A").await?;
    fs.upload_file(Some(&a.id), "x.pdf", vec![9], "application/pdf")
        .await?;

    fs.clear_all().await?;
    assert!(fs.store().get_all().await?.is_empty());
    assert!(fs.store().get_by_parent(None).await?.is_empty());
    Ok(())
}
