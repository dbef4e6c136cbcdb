//! The `perceptest init` command.

use std::path::Path;

use anyhow::Result;

use perceptest_core::config::CONFIG_FILE_NAME;

pub fn execute() -> Result<()> {
    if Path::new(CONFIG_FILE_NAME).exists() {
        println!("{CONFIG_FILE_NAME} already exists, skipping.");
    } else {
        std::fs::write(CONFIG_FILE_NAME, SAMPLE_CONFIG)?;
        println!("Created {CONFIG_FILE_NAME}");
    }

    std::fs::create_dir_all("corpus")?;
    let example_path = Path::new("corpus/example.json");
    if example_path.exists() {
        println!("corpus/example.json already exists, skipping.");
    } else {
        std::fs::write(example_path, EXAMPLE_CORPUS)?;
        println!("Created corpus/example.json");
    }

    println!("\nNext steps:");
    println!("  1. Put the scene images under images/");
    println!("  2. Run: perceptest validate --corpus corpus/example.json");
    println!("  3. Run: perceptest run");

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# perceptest configuration

corpus = "corpus/example.json"
# format = "json"          # json or tsv; detected from the extension when unset
image_dir = "images/"
time_limit_secs = 8
output_dir = "./perceptest-results"
cue = true
"#;

const EXAMPLE_CORPUS: &str = r#"{
  "scene_1.png": [
    {
      "question": "What is the shape of the red object?",
      "answer": "circle",
      "question_vector": [0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 1]
    },
    {
      "question": "Is the green object on the left or right?",
      "answer": "left",
      "question_vector": [0, 0, 0, 0, 0, 0, 0, 0, 0, 1, 0]
    },
    {
      "question": "Is the blue object at the top or bottom?",
      "answer": "top",
      "question_vector": [0, 0, 0, 0, 0, 0, 0, 0, 1, 0, 0]
    }
  ],
  "scene_2.png": [
    {
      "question": "What colour is the object closest to the yellow one?",
      "answer": "pink",
      "question_vector": [0, 0, 0, 0, 0, 0, 1, 0, 1, 0, 0]
    },
    {
      "question": "What shape is the object farthest from the orange one?",
      "answer": "square",
      "question_vector": [0, 0, 0, 0, 0, 0, 1, 0, 0, 1, 0]
    },
    {
      "question": "How many objects have the same shape as the blue one?",
      "answer": 3,
      "question_vector": [0, 0, 0, 0, 0, 0, 1, 0, 0, 0, 1]
    }
  ]
}
"#;
