//! Synthetic PDFs for unit tests

use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream};

pub fn widget(name: &str, rect: [f64; 4]) -> Dictionary {
    dictionary! {
        "Type" => "Annot",
        "Subtype" => "Widget",
        "FT" => "Tx",
        "T" => Object::string_literal(name),
        "Rect" => rect.iter().map(|v| Object::Real(*v as f32)).collect::<Vec<_>>(),
    }
}

struct PagePlan {
    annots: Option<Vec<Dictionary>>,
}

pub struct PdfBuilder {
    label: String,
    pages: Vec<PagePlan>,
    nested: bool,
    indirect_annots: bool,
    acroform: bool,
    media_box: [i64; 4],
}

impl PdfBuilder {
    pub fn new() -> Self {
        Self {
            label: "Doc".to_string(),
            pages: Vec::new(),
            nested: false,
            indirect_annots: false,
            acroform: true,
            media_box: [0, 0, 612, 792],
        }
    }

    /// Text drawn on every page is `<label>-Page-<n>`
    pub fn label(&mut self, label: &str) -> &mut Self {
        self.label = label.to_string();
        self
    }

    pub fn nested_pages(&mut self, nested: bool) -> &mut Self {
        self.nested = nested;
        self
    }

    pub fn indirect_annots(&mut self, indirect: bool) -> &mut Self {
        self.indirect_annots = indirect;
        self
    }

    pub fn acroform(&mut self, acroform: bool) -> &mut Self {
        self.acroform = acroform;
        self
    }

    pub fn media_box(&mut self, media_box: [i64; 4]) -> &mut Self {
        self.media_box = media_box;
        self
    }

    pub fn page(&mut self) -> &mut Self {
        self.pages.push(PagePlan { annots: None });
        self
    }

    pub fn pages(&mut self, count: usize) -> &mut Self {
        for _ in 0..count {
            self.page();
        }
        self
    }

    pub fn page_with_annots(&mut self, annots: Vec<Dictionary>) -> &mut Self {
        self.pages.push(PagePlan {
            annots: Some(annots),
        });
        self
    }

    pub fn build_document(&self) -> Document {
        let mut doc = Document::with_version("1.7");
        let pages_id = doc.new_object_id();

        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        });

        let mut widget_ids = Vec::new();
        let mut leaves: Vec<ObjectId> = Vec::new();
        for (index, plan) in self.pages.iter().enumerate() {
            let content = format!(
                "BT /F1 12 Tf 72 720 Td ({}-Page-{}) Tj ET",
                self.label,
                index + 1
            );
            let content_id = doc.add_object(Stream::new(Dictionary::new(), content.into_bytes()));

            let mut page = dictionary! {
                "Type" => "Page",
                "MediaBox" => self.media_box.iter().map(|v| Object::Integer(*v)).collect::<Vec<_>>(),
                "Contents" => Object::Reference(content_id),
                "Resources" => dictionary! {
                    "Font" => dictionary! { "F1" => Object::Reference(font_id) },
                },
            };

            if let Some(annots) = &plan.annots {
                let refs: Vec<Object> = annots
                    .iter()
                    .map(|annot| {
                        let id = doc.add_object(annot.clone());
                        widget_ids.push(id);
                        Object::Reference(id)
                    })
                    .collect();
                if self.indirect_annots {
                    let array_id = doc.add_object(Object::Array(refs));
                    page.set("Annots", Object::Reference(array_id));
                } else {
                    page.set("Annots", Object::Array(refs));
                }
            }

            leaves.push(doc.add_object(page));
        }

        let kids = if self.nested {
            leaves
                .chunks(2)
                .map(|chunk| {
                    let node_id = doc.add_object(dictionary! {
                        "Type" => "Pages",
                        "Parent" => Object::Reference(pages_id),
                        "Kids" => chunk.iter().map(|id| Object::Reference(*id)).collect::<Vec<_>>(),
                        "Count" => chunk.len() as i64,
                    });
                    for leaf in chunk {
                        set_parent(&mut doc, *leaf, node_id);
                    }
                    node_id
                })
                .collect::<Vec<_>>()
        } else {
            for leaf in &leaves {
                set_parent(&mut doc, *leaf, pages_id);
            }
            leaves.clone()
        };

        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids.iter().map(|id| Object::Reference(*id)).collect::<Vec<_>>(),
                "Count" => leaves.len() as i64,
            }),
        );

        let mut catalog = dictionary! {
            "Type" => "Catalog",
            "Pages" => Object::Reference(pages_id),
        };
        if self.acroform {
            catalog.set(
                "AcroForm",
                dictionary! {
                    "Fields" => widget_ids.iter().map(|id| Object::Reference(*id)).collect::<Vec<_>>(),
                },
            );
        }
        let catalog_id = doc.add_object(catalog);
        doc.trailer.set("Root", Object::Reference(catalog_id));
        doc
    }

    pub fn build(&self) -> Vec<u8> {
        let mut doc = self.build_document();
        let mut buffer = Vec::new();
        doc.save_to(&mut buffer).unwrap();
        buffer
    }
}

fn set_parent(doc: &mut Document, child: ObjectId, parent: ObjectId) {
    if let Ok(Object::Dictionary(dict)) = doc.get_object_mut(child) {
        dict.set("Parent", Object::Reference(parent));
    }
}

/// All decoded content of a page, as text
pub fn page_content_text(doc: &Document, page_index: usize) -> String {
    let page_id = doc.get_pages().into_values().nth(page_index).unwrap();
    String::from_utf8_lossy(&crate::objects::page_content(doc, page_id).unwrap()).into_owned()
}
