/// A small generated component, as a model would stream it back.
pub fn todo_app_fixture() -> &'static str {
    return r#"
import { useState } from "react";

export default function App() {
  const [todos, setTodos] = useState([]);
  const [text, setText] = useState("");

  return (
    <div className="p-4">
      <input value={text} onChange={(e) => setText(e.target.value)} />
      <button onClick={() => setTodos([...todos, text])}>Add</button>
      <ul>
        {todos.map((todo, idx) => (
          <li key={idx}>{todo}</li>
        ))}
      </ul>
    </div>
  );
}
"#
    .trim();
}

/// Splits a fixture into uneven fragments the way a token stream delivers
/// them. Concatenating the result yields the input back.
pub fn split_into_deltas(text: &str, sizes: &[usize]) -> Vec<String> {
    let chars = text.chars().collect::<Vec<char>>();
    let mut deltas: Vec<String> = vec![];
    let mut offset = 0;
    let mut size_idx = 0;

    while offset < chars.len() {
        let size = sizes[size_idx % sizes.len()].max(1);
        let end = (offset + size).min(chars.len());
        deltas.push(chars[offset..end].iter().collect());
        offset = end;
        size_idx += 1;
    }

    return deltas;
}

/// Renders chat-completion chunks as newline delimited JSON, one chunk per
/// delta, matching what a streaming generation endpoint responds with.
pub fn completion_chunks_body(deltas: &[&str]) -> String {
    return deltas
        .iter()
        .map(|delta| {
            let escaped = delta
                .replace('\\', "\\\\")
                .replace('"', "\\\"")
                .replace('\n', "\\n");
            return format!(r#"{{"choices":[{{"delta":{{"content":"{escaped}"}}}}]}}"#);
        })
        .collect::<Vec<String>>()
        .join("\n");
}
