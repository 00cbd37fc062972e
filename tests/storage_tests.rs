use catalog_admin::storage::{
    MockStorageService, S3StorageClient, StorageService, category_image_key, sanitize_key,
};

#[cfg(test)]
mod mock_tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_success() {
        let mock = MockStorageService::new();
        let key = "categories/shoes.png";

        let url = mock.get_presigned_upload_url(key, "image/png").await.unwrap();

        assert!(url.contains("signature=fake"));
        assert!(url.contains(key));
    }

    #[tokio::test]
    async fn test_mock_failure() {
        let mock = MockStorageService::new_failing();
        assert!(mock.get_presigned_upload_url("a.png", "image/png").await.is_err());
        assert!(mock.ensure_bucket_exists().await.is_err());
    }

    #[tokio::test]
    async fn test_mock_sanitization() {
        let mock = MockStorageService::new();

        let url = mock
            .get_presigned_upload_url("../../etc/passwd", "image/png")
            .await
            .unwrap();

        assert!(!url.contains(".."));
    }
}

mod key_tests {
    use super::*;

    #[test]
    fn test_sanitize_key_drops_navigation_segments() {
        assert_eq!(sanitize_key("/categories/./../a.png"), "categories/a.png");
        assert_eq!(sanitize_key("categories//b.png"), "categories/b.png");
    }

    #[test]
    fn test_category_image_key_keeps_extension() {
        let key = category_image_key("Summer Shoes.JPG");
        assert!(key.starts_with("categories/"));
        assert!(key.ends_with(".jpg"));
        assert!(!key.contains(' '));
    }

    #[test]
    fn test_category_image_key_defaults_to_bin() {
        assert!(category_image_key("noextension").ends_with(".bin"));
        assert!(category_image_key("weird.p/ng").ends_with(".bin"));
    }

    #[test]
    fn test_keys_are_unique() {
        assert_ne!(category_image_key("a.png"), category_image_key("a.png"));
    }
}

#[cfg(test)]
mod s3_tests {
    use super::*;

    #[tokio::test]
    async fn test_s3_presign_is_offline() {
        // Presigning only signs locally; no request reaches the endpoint.
        let client = S3StorageClient::new(
            "http://localhost:9000",
            "us-east-1",
            "admin",
            "password",
            "catalog-test",
        );

        let url = client
            .get_presigned_upload_url("categories/a.png", "image/png")
            .await
            .unwrap();

        assert!(url.starts_with("http://localhost:9000/catalog-test/categories/a.png"));
        assert!(url.contains("X-Amz-Signature"));
    }
}
