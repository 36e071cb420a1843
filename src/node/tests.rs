#[cfg(test)]
mod tests {
    use super::super::*;
    use crate::constants::label;

    #[test]
    fn test_architecture_from_label() {
        let node = Node::new("node").with_label(label::ARCH, "arm64");
        assert_eq!(node.architecture(label::ARCH), Some(Architecture::new("arm64")));
    }

    #[test]
    fn test_missing_or_empty_label_is_absent() {
        assert_eq!(Node::new("node").architecture(label::ARCH), None);

        let empty = Node::new("node").with_label(label::ARCH, "");
        assert_eq!(empty.architecture(label::ARCH), None);
    }

    #[test]
    fn test_label_value_is_not_normalized() {
        let padded = Node::new("node").with_label(label::ARCH, " arm64 ");
        let arch = padded.architecture(label::ARCH).unwrap();
        assert_eq!(arch.as_str(), " arm64 ");
        assert!(arch != *"arm64");
    }

    #[test]
    fn test_custom_label_key() {
        let node = Node::new("node").with_label("example.com/cpu", "s390x");
        assert_eq!(node.architecture(label::ARCH), None);
        assert_eq!(
            node.architecture("example.com/cpu"),
            Some(Architecture::new("s390x"))
        );
    }

    #[test]
    fn test_architecture_comparison_is_exact() {
        let arch = Architecture::new("arm64");
        assert!(arch == *"arm64");
        assert!(arch != *"ARM64");
        assert!(arch != *"aarch64");
    }

    #[test]
    fn test_from_node_document() {
        let yaml = r#"
apiVersion: v1
kind: Node
metadata:
  name: worker-1
  labels:
    kubernetes.io/arch: amd64
    kubernetes.io/os: linux
"#;
        let node = Node::from_node_document(yaml).unwrap();
        assert_eq!(node.name, "worker-1");
        assert_eq!(node.architecture(label::ARCH), Some(Architecture::new("amd64")));
    }

    #[test]
    fn test_from_node_document_without_labels() {
        let node = Node::from_node_document("metadata:\n  name: bare\n").unwrap();
        assert_eq!(node.name, "bare");
        assert!(node.labels.is_empty());
    }
}
