use encoding_rs::Encoding;
use html5ever::serialize::{serialize, SerializeOpts};
use markup5ever_rcdom::{Handle, SerializableHandle};

/// 序列化文档
///
/// 先序列化为 UTF-8，再按文档编码重新编码。`document_encoding` 为空或无法识别时保持 UTF-8。
pub fn serialize_document(document: &Handle, document_encoding: &str) -> std::io::Result<Vec<u8>> {
    let mut buf: Vec<u8> = Vec::new();

    let serializable: SerializableHandle = document.clone().into();
    serialize(&mut buf, &serializable, SerializeOpts::default())?;

    if !document_encoding.is_empty() {
        if let Some(encoding) = Encoding::for_label(document_encoding.as_bytes()) {
            let s: &str = &String::from_utf8_lossy(&buf);
            let (data, _, _) = encoding.encode(s);
            buf = data.to_vec();
        }
    }

    Ok(buf)
}
